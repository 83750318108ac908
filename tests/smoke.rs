//! Basic smoke test to verify the public API surface.

#[test]
fn crate_compiles() {
    let _ = std::any::type_name::<tierlock::TierlockConfig>();
    let _ = std::any::type_name::<tierlock::TierlockError>();
    let _ = std::any::type_name::<tierlock::LicenseManager>();
}

#[test]
fn manager_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<tierlock::LicenseManager>();
}
