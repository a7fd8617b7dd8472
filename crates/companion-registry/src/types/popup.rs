use crate::action_type::{ActionKind, SupportKind};
use crate::context::ResolveContext;
use crate::mapper::{read_string, write_slot, ParameterMapper};
use companion_core::{ArgSlot, GenericAction};

pub const POPUP_CODE: i64 = 550;
pub const POPUP_NAME: &str = "Popup";

const MESSAGE_SLOT: i64 = 1;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupParams {
    pub message: String,
}

impl ParameterMapper for PopupParams {
    fn decode(action: &GenericAction, _ctx: &ResolveContext) -> Self {
        Self {
            message: read_string(action, MESSAGE_SLOT),
        }
    }

    fn encode(&mut self, action: &mut GenericAction, _ctx: &ResolveContext) {
        write_slot(action, MESSAGE_SLOT, self.message.as_str());
    }
}

impl ActionKind for PopupParams {
    const ID: &'static str = "popup";
    const NAME: &'static str = "Popup";
    const SUPPORT: SupportKind = SupportKind::Custom;
    const SHOW_ARGS: bool = false;

    fn recognizes(&self, action: &GenericAction, _ctx: &ResolveContext) -> bool {
        action.is(POPUP_CODE, POPUP_NAME)
    }

    fn describe(&self) -> String {
        format!("Message: {}", self.message)
    }

    fn template() -> Option<GenericAction> {
        Some(GenericAction::new(POPUP_CODE, POPUP_NAME).with_args(vec![
            ArgSlot::new(0, "Title", ""),
            ArgSlot::new(MESSAGE_SLOT, "Text", ""),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message() {
        let action = GenericAction::new(POPUP_CODE, POPUP_NAME)
            .with_args(vec![ArgSlot::new(1, "Text", "Hello")]);
        let params = PopupParams::decode(&action, &ResolveContext::default());
        assert_eq!(params.message, "Hello");
        assert_eq!(params.describe(), "Message: Hello");
        assert!(params.recognizes(&action, &ResolveContext::default()));
    }

    #[test]
    fn test_requires_code_and_name() {
        let ctx = ResolveContext::default();
        let renamed = GenericAction::new(POPUP_CODE, "Flash");
        let params = PopupParams::decode(&renamed, &ctx);
        assert!(!params.recognizes(&renamed, &ctx));
        assert!(params.message.is_empty());
    }
}
