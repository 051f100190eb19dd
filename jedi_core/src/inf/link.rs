use jedi_level_format::{InfEntityMask, InfEventMask, LinkType};

use super::{InfContext, InfElevator, InfMessage, InfTrigger, LinkTarget};

/// Stable index into the link arena. Freed links leave a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Keep,
    /// Remove the link from the arena.
    Free,
}

pub trait InfLinkHandler {
    fn handle_message(&mut self, msg: &InfMessage, ctx: &mut InfContext) -> LinkOutcome;

    /// Called once per INF update.
    fn update(&mut self, _ctx: &mut InfContext) -> LinkOutcome {
        LinkOutcome::Keep
    }
}

#[derive(Debug)]
pub enum InfLinkItem {
    Elevator(Box<InfElevator>),
    Trigger(Box<InfTrigger>),
}

impl InfLinkItem {
    pub fn handler_mut(&mut self) -> &mut dyn InfLinkHandler {
        match self {
            InfLinkItem::Elevator(elevator) => &mut **elevator,
            InfLinkItem::Trigger(trigger) => &mut **trigger,
        }
    }
}

#[derive(Debug)]
pub struct InfLink {
    pub item: InfLinkItem,
    pub target: LinkTarget,
    pub event_mask: InfEventMask,
    pub entity_mask: InfEntityMask,
}

impl InfLink {
    pub fn link_type(&self) -> LinkType {
        match self.item {
            InfLinkItem::Elevator(_) => LinkType::Sector,
            InfLinkItem::Trigger(_) => LinkType::Trigger,
        }
    }

    pub fn elevator(&self) -> Option<&InfElevator> {
        match &self.item {
            InfLinkItem::Elevator(elevator) => Some(&**elevator),
            _ => None,
        }
    }

    pub fn elevator_mut(&mut self) -> Option<&mut InfElevator> {
        match &mut self.item {
            InfLinkItem::Elevator(elevator) => Some(&mut **elevator),
            _ => None,
        }
    }

    pub fn trigger(&self) -> Option<&InfTrigger> {
        match &self.item {
            InfLinkItem::Trigger(trigger) => Some(&**trigger),
            _ => None,
        }
    }

    pub fn trigger_mut(&mut self) -> Option<&mut InfTrigger> {
        match &mut self.item {
            InfLinkItem::Trigger(trigger) => Some(&mut **trigger),
            _ => None,
        }
    }

    /// Empty message masks match anything.
    pub fn accepts(&self, msg: &InfMessage) -> bool {
        (msg.event.is_empty() || self.event_mask.intersects(msg.event))
            && (msg.entity.is_empty() || self.entity_mask.intersects(msg.entity))
    }
}
