use ultraviolet::Vec2;

/// Even-odd containment test against a set of edges.
///
/// Sectors may hold several loops (holes, islands), so the test runs over
/// every edge instead of a single contour. Points exactly on an edge are
/// outside.
pub fn point_in_edges(point: Vec2, edges: impl IntoIterator<Item = (Vec2, Vec2)>) -> bool {
    let mut k = 0;

    for (start, end) in edges {
        let u1 = start.x - point.x;
        let v1 = start.y - point.y;
        let u2 = end.x - point.x;
        let v2 = end.y - point.y;

        if (v1 < 0.0 && v2 < 0.0) || (v1 > 0.0 && v2 > 0.0) {
            continue;
        }

        let f = (u1 * v2) - (u2 * v1);
        if v2 > 0.0 && v1 <= 0.0 {
            if f > 0.0 {
                k += 1;
            } else if f == 0.0 {
                return false;
            }
        } else if v1 > 0.0 && v2 <= 0.0 {
            if f < 0.0 {
                k += 1;
            } else if f == 0.0 {
                return false;
            }
        } else if (v2 == 0.0 && v1 < 0.0) || (v1 == 0.0 && v2 < 0.0) {
            if f == 0.0 {
                return false;
            }
        } else if v1 == 0.0 && v2 == 0.0 && ((u2 <= 0.0 && u1 >= 0.0) || (u1 <= 0.0 && u2 >= 0.0))
        {
            return false;
        }
    }

    k % 2 == 1
}
