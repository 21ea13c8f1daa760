/// Lock around a [`Pca9536`][crate::Pca9536] shared by several [`Pin`][crate::Pin] handles.
///
/// The driver itself does no locking and its single-pin writes take two bus transactions (read,
/// then write back).  [`SharedPca9536`][crate::SharedPca9536] keeps the driver inside a
/// `PortMutex` and every pin operation runs as one `lock()` call: the register read, the write
/// back and the status check all happen while the lock is held, and the lock is released when
/// the closure returns, on the error path as well.  Register-level access through
/// [`SharedPca9536::lock()`][crate::SharedPca9536::lock] takes the same lock.
///
/// The lock only covers this driver.  If other devices share the bus from other threads, the
/// bus implementation has to serialize those transfers itself.
///
/// | Mutex | Feature Name | Notes |
/// | --- | --- | --- |
/// | [`core::cell::RefCell`] | _always available_ | Single execution context; a nested `lock()` panics. |
/// | [`std::sync::Mutex`][mutex-std] | `std` | Threads on hosted platforms. |
/// | [`critical_section::Mutex<RefCell<_>>`][mutex-cs] | `critical-section` | Pins used from interrupt handlers; the whole operation runs inside the critical section. |
///
/// [mutex-std]: https://doc.rust-lang.org/std/sync/struct.Mutex.html
/// [mutex-cs]: https://docs.rs/critical-section/latest/critical_section/struct.Mutex.html
///
/// Other lock types need a newtype because of the orphan rule:
///
/// ```
/// use pca9536_driver::{PortMutex, SharedPca9536};
///
/// struct SpinLock<T>(std::sync::Mutex<T>);
///
/// impl<T> PortMutex for SpinLock<T> {
///     type Port = T;
///
///     fn create(driver: T) -> Self {
///         Self(std::sync::Mutex::new(driver))
///     }
///
///     fn lock<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
///         let mut driver = self.0.lock().unwrap();
///         f(&mut driver)
///     }
/// }
///
/// # let mut i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
/// let shared: SharedPca9536<SpinLock<_>> =
///     SharedPca9536::with_mutex(pca9536_driver::Pca9536::new(i2c.clone()));
/// assert_eq!(shared.lock(|drv| drv.com_result()), 0);
/// # i2c.done();
/// ```
pub trait PortMutex {
    /// The driver wrapped inside this mutex.
    type Port;

    /// Wrap `driver`.
    fn create(driver: Self::Port) -> Self;

    /// Run `f` with exclusive access to the driver; the lock is held until `f` returns.
    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R;
}

impl<T> PortMutex for core::cell::RefCell<T> {
    type Port = T;

    fn create(driver: Self::Port) -> Self {
        core::cell::RefCell::new(driver)
    }

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R {
        f(&mut self.borrow_mut())
    }
}

#[cfg(any(test, feature = "std"))]
impl<T> PortMutex for std::sync::Mutex<T> {
    type Port = T;

    fn create(driver: Self::Port) -> Self {
        std::sync::Mutex::new(driver)
    }

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R {
        // a poisoned lock means a pin operation panicked halfway through
        let mut driver = self.lock().unwrap();
        f(&mut driver)
    }
}

#[cfg(feature = "critical-section")]
impl<T> PortMutex for critical_section::Mutex<core::cell::RefCell<T>> {
    type Port = T;

    fn create(driver: Self::Port) -> Self {
        critical_section::Mutex::new(core::cell::RefCell::new(driver))
    }

    fn lock<R, F: FnOnce(&mut Self::Port) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| {
            f(&mut self.borrow_ref_mut(cs))
        })
    }
}
