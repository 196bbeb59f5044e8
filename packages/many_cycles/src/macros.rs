/// Profiles the rest of the enclosing block as a zone of the current thread's profiler.
///
/// Each call site gets its own [`AnchorId`][crate::AnchorId], allocated the first time the
/// call site executes. The zone closes when the enclosing block ends.
///
/// The optional second argument is the number of bytes the zone processes, used to report
/// throughput.
///
/// # Examples
///
/// ```
/// use many_cycles::{begin_profile, end_profile, zone};
///
/// fn checksum(data: &[u8]) -> u64 {
///     zone!("checksum", data.len() as u64);
///
///     data.iter().map(|&b| u64::from(b)).sum()
/// }
///
/// begin_profile();
///
/// {
///     zone!("main");
///
///     let data = vec![7_u8; 4096];
///     std::hint::black_box(checksum(&data));
/// }
///
/// let report = end_profile();
/// assert!(!report.is_empty());
/// ```
///
/// Zones opened this way cannot be closed early. Use [`open_zone()`][crate::open_zone] to get
/// a [`Zone`][crate::Zone] guard that can be closed explicitly.
#[macro_export]
macro_rules! zone {
    ($label:expr) => {
        $crate::zone!($label, 0)
    };
    ($label:expr, $byte_count:expr) => {
        let _many_cycles_zone = {
            static ANCHOR: ::std::sync::OnceLock<$crate::AnchorId> = ::std::sync::OnceLock::new();

            $crate::open_zone(
                $label,
                *ANCHOR.get_or_init($crate::AnchorId::allocate),
                $byte_count,
            )
        };
    };
}
