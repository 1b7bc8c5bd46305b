#[test]
fn macros_accept_tracing_syntax() {
    solio_log::trace!("trace");
    solio_log::debug!(answer = 42, "debug");
    solio_log::info!("info");
    solio_log::warn!("warn");
    solio_log::error!("error");
    solio_log::event!(solio_log::Level::DEBUG, "event");
    solio_log::instrument!(solio_log::Level::TRACE, "span", field = 1);
}
