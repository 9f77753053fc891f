/// A record in a remotely stored collection
///
/// `id` is server-assigned and unique within its collection. The soft-delete
/// and active flags are optional: not every resource has them.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    fn is_active(&self) -> Option<bool> {
        None
    }

    fn is_deleted(&self) -> Option<bool> {
        None
    }
}
