use tracing::Level;

/// Install a stderr `fmt` subscriber: `ERROR` only in production, `DEBUG` otherwise.
///
/// Returns `false` if a global subscriber was already set (by an earlier call
/// or by the host application); that one stays in place.
pub fn init_tracing(prod: bool) -> bool {
    let level = if prod { Level::ERROR } else { Level::DEBUG };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .try_init()
        .is_ok()
}
