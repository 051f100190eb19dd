use jedi_level_format::{InfEntityMask, InfEventMask, InfMessageType, KeyItem, TriggerType};

use crate::components::TextureId;

use super::{InfContext, InfEvent, InfLinkHandler, InfMessage, LinkOutcome, MessageTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTarget {
    pub target: MessageTarget,
    /// Event bits sent along; empty uses the trigger's own.
    pub event_mask: InfEventMask,
}

#[derive(Debug, Clone)]
pub struct InfTrigger {
    pub trigger_type: TriggerType,

    pub cmd: InfMessageType,
    pub arg0: u32,
    pub arg1: u32,
    pub event: InfEventMask,
    pub targets: Vec<TriggerTarget>,

    pub master: bool,
    /// On for toggles and pressed switches.
    pub state: bool,
    /// Single triggers fire once.
    pub consumed: bool,

    pub key: Option<KeyItem>,
    pub text_id: Option<u32>,
    /// Switch sign, frame 1 shows "on".
    pub switch_texture: Option<TextureId>,
}

impl InfTrigger {
    pub fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            cmd: InfMessageType::Trigger,
            arg0: 0,
            arg1: 0,
            event: InfEventMask::empty(),
            targets: vec![],
            master: true,
            state: false,
            consumed: false,
            key: None,
            text_id: None,
            switch_texture: None,
        }
    }

    fn activate(&mut self, msg: &InfMessage, ctx: &mut InfContext) {
        if !self.master || !ctx.check_key(self.key, msg) {
            return;
        }

        let frame = match self.trigger_type {
            TriggerType::Standard | TriggerType::Sector => {
                self.state = !self.state;
                self.state as usize
            }
            TriggerType::Switch1 => {
                if self.state {
                    return;
                }
                self.state = true;
                1
            }
            TriggerType::Toggle => {
                self.state = !self.state;
                self.state as usize
            }
            TriggerType::Single => {
                if self.consumed {
                    return;
                }
                self.consumed = true;
                1
            }
        };

        self.fire(ctx);
        self.set_switch_frame(ctx, frame);

        if let Some(text_id) = self.text_id {
            ctx.emit(InfEvent::Text(text_id));
        }
    }

    fn fire(&self, ctx: &mut InfContext) {
        for target in &self.targets {
            let event = if target.event_mask.is_empty() {
                self.event
            } else {
                target.event_mask
            };

            let mut msg = InfMessage::new(target.target, self.cmd)
                .with_event(event, InfEntityMask::empty())
                .with_args(self.arg0, self.arg1);
            msg.sender = Some(ctx.link);
            ctx.send(msg);
        }
    }

    fn set_switch_frame(&self, ctx: &mut InfContext, frame: usize) {
        if let Some(texture) = self.switch_texture {
            ctx.geometry.animations.set_frame(texture, frame);
        }
    }
}

impl InfLinkHandler for InfTrigger {
    fn handle_message(&mut self, msg: &InfMessage, ctx: &mut InfContext) -> LinkOutcome {
        match msg.msg_type {
            InfMessageType::Trigger => self.activate(msg, ctx),
            // The elevator a switch started has stopped: pop the switch back.
            InfMessageType::Done => {
                if self.trigger_type == TriggerType::Switch1 {
                    self.state = false;
                    self.set_switch_frame(ctx, 0);
                }
            }
            InfMessageType::MasterOn => self.master = true,
            InfMessageType::MasterOff => self.master = false,
            _ => {}
        }
        LinkOutcome::Keep
    }
}
