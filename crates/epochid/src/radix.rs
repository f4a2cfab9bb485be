/// Digit table shared by every radix in `[MIN_BASE, MAX_BASE]`.
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Smallest radix accepted for timestamp and counter encoding.
pub const MIN_BASE: u32 = 2;

/// Largest radix accepted for timestamp and counter encoding.
pub const MAX_BASE: u32 = 36;

/// Widest possible rendering of a `u64` (base 2).
const MAX_DIGITS: usize = u64::BITS as usize;

/// Returns `true` when `base` can be used with [`encode_radix`].
pub const fn is_valid_base(base: u32) -> bool {
    base >= MIN_BASE && base <= MAX_BASE
}

/// Appends `value` rendered in `base` to `out`, using lower-case digits and no
/// padding.
///
/// The caller guarantees `base` lies in `[MIN_BASE, MAX_BASE]`; configuration
/// validation enforces this before any encoding happens.
pub fn push_radix(out: &mut String, mut value: u64, base: u32) {
    debug_assert!(is_valid_base(base), "base {base} out of range");

    let base = u64::from(base);
    let mut buf = [0_u8; MAX_DIGITS];
    let mut pos = MAX_DIGITS;

    loop {
        pos -= 1;
        // `value % base` is below 36, always in-bounds for `ALPHABET`.
        buf[pos] = ALPHABET[(value % base) as usize];
        value /= base;
        if value == 0 {
            break;
        }
    }

    for &digit in &buf[pos..] {
        out.push(char::from(digit));
    }
}

/// Renders `value` in `base` as a new string.
///
/// # Example
///
/// ```
/// use epochid::encode_radix;
///
/// assert_eq!(encode_radix(35, 36), "z");
/// assert_eq!(encode_radix(5, 2), "101");
/// ```
pub fn encode_radix(value: u64, base: u32) -> String {
    let mut out = String::with_capacity(16);
    push_radix(&mut out, value, base);
    out
}
