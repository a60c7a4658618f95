use crate::prelude::*;

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;
use tracing::subscriber::SetGlobalDefaultError;

#[macro_export]
macro_rules! tensor {
    ($x:expr) => {
        Tensor::new($x)
    };
    ($($x:expr),*) => {
        Tensor::new(array![$($x,)*])
    };
}

/// Tensor of the given shape drawn from `Uniform(-bound, bound)` with `rng`.
#[macro_export]
macro_rules! rand_tensor {
    ($rng:expr, $bound:expr; $($x:expr),*) => {
        Tensor::new(Array::random_using(
            ($($x as usize,)*),
            Uniform::new(-($bound as f32), $bound as f32),
            $rng,
        ))
    };
}

/// Runs the block without recording an autodiff graph on this thread.
#[macro_export]
macro_rules! no_grad {
    ($($block:tt)*) => {{
        let _guard = $crate::utils::NoGradGuard::new();
        $($block)*
    }};
}

pub type DynArray = ArrayD<f32>;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = Cell::new(true);
}

pub fn grad_enabled() -> bool {
    GRAD_ENABLED.with(Cell::get)
}

/// Disables graph recording until dropped, then restores the previous state.
pub struct NoGradGuard {
    previous: bool,
}

impl NoGradGuard {
    pub fn new() -> Self {
        let previous = GRAD_ENABLED.with(|enabled| enabled.replace(false));
        Self { previous }
    }
}

impl Default for NoGradGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NoGradGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|enabled| enabled.set(self.previous));
    }
}

/// Compact `tracing` output on stderr; stdout is left to the progress lines.
pub fn install_logger() -> std::result::Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

/// Release builds get a crash report instead of a backtrace.
#[cfg(not(debug_assertions))]
fn install_panic_hook() {
    setup_panic!();
}

/// Debug builds print the full backtrace, oldest frame first.
#[cfg(debug_assertions)]
fn install_panic_hook() {
    better_panic::Settings::debug()
        .most_recent_first(false)
        .lineno_suffix(true)
        .verbosity(better_panic::Verbosity::Full)
        .install();
}

/// Panic hook and global subscriber for the binary. Fails if a subscriber is
/// already installed.
pub fn init_logging() -> Result<()> {
    install_panic_hook();
    install_logger()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_grad_restores_previous_state() {
        assert!(grad_enabled());
        no_grad!({
            assert!(!grad_enabled());
            no_grad!({ assert!(!grad_enabled()) });
            assert!(!grad_enabled());
        });
        assert!(grad_enabled());
    }

    #[test]
    fn no_grad_is_thread_local() {
        no_grad!({
            let other = std::thread::spawn(grad_enabled).join().unwrap();
            assert!(other);
        });
    }

    #[test]
    fn second_logger_is_refused() {
        let _ = install_logger();
        assert!(install_logger().is_err());
    }

    #[test]
    fn rand_tensor_respects_bound_and_seed() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        let x = rand_tensor!(&mut a, 0.5; 4, 3);
        let y = rand_tensor!(&mut b, 0.5; 4, 3);

        assert_eq!(x.shape(), vec![4, 3]);
        assert_eq!(x.data(), y.data());
        assert!(x.data().iter().all(|v| (-0.5..0.5).contains(v)));
    }
}
