/// Calls the closure until it succeeds, the error is not transient, or three retries are spent.
/// The wait starts at the given duration and doubles between attempts.
#[macro_export]
macro_rules! retry {
    ($wait:expr, $f:expr) => {{
        let mut wait: std::time::Duration = $wait;
        let mut retries: u32 = 0;
        loop {
            let res = $f();
            match &res {
                Err(e) if e.is_transient() && retries < 3 => {
                    log::warn!("transient failure, retrying in {:?}: {}", wait, e);
                    std::thread::sleep(wait);
                    wait *= 2;
                    retries += 1;
                }
                _ => break res,
            }
        }
    }};
}
