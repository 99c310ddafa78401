use std::time::Duration;

/// Run `f` up to `retries + 1` times, sleeping `backoff` between attempts.
pub fn retry<F, T, E>(mut f: F, retries: usize, backoff: Duration) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Debug,
{
    for i in 0..=retries {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if i == retries => return Err(e),
            Err(e) => {
                log::warn!(
                    "Failed to execute operation (retry {} of {retries}): {e:?}",
                    i + 1
                );
                std::thread::sleep(backoff);
            }
        }
    }

    unreachable!()
}
