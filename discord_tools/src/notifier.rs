use crate::Embed;

/// Something that can post embeds to a staff channel.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Whether notifications are configured at all. Jobs should do nothing when this is `false`.
    fn is_enabled(&self) -> bool;

    /// Posts the embeds as a single message. Returns `true` if the message was accepted. Never fails loudly.
    async fn notify(&self, embeds: Vec<Embed>) -> bool;
}
