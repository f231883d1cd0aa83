/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    pub supports_menu_keyboard: bool,
    pub supports_delete: bool,
    pub max_message_len: usize,
}
