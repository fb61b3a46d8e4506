use std::sync::OnceLock;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter("stampede=debug,mock_service=debug")
            .init();
    });
}
