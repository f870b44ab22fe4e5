//! NaN-boxed value representation.
//!
//! Every Opal value is a single 64-bit word. Floats are stored as their own
//! IEEE-754 bits; every other kind of value lives inside the quiet-NaN
//! payload space, distinguished by tag bits that no canonicalized float can
//! carry:
//!
//! ```text
//! float      seeeeeee eeee mmmm ... mmmm   (any bits outside the tag space)
//! none       0 7FFC   kind=00  payload=0
//! false/true 0 7FFC   kind=00  payload=1/2
//! int        0 7FFC   kind=01  payload=low 48 bits, two's complement
//! object     1 7FFC   payload=48-bit pointer
//! ```
//!
//! Two consequences matter to the rest of the runtime:
//!
//! - A buffer of float-valued words is bit-for-bit identical to a raw `f64`
//!   buffer. Storage code that sees an all-float fill cannot tell a tagged
//!   slot buffer from an unboxed numeric one by looking at the bits.
//! - The all-zero word decodes as float `+0.0`. The canonical zero *scalar*
//!   is the tagged int `0` ([`Value::zero`]), which is never confusable
//!   with a float or a pointer.
//!
//! Hardware-produced NaNs are canonicalized by [`Value::float`] so that no
//! float ever aliases the tag space.

/// Quiet-NaN prefix claimed for non-float values.
///
/// Real arithmetic NaNs are `0x7ff8_...` and never carry bit 50, so they
/// fall outside this mask and classify as floats.
const QNAN: u64 = 0x7ffc_0000_0000_0000;

/// Sign bit; set together with [`QNAN`] it marks an object pointer.
const SIGN: u64 = 0x8000_0000_0000_0000;

/// Immediate-kind field (bits 48–49) under the quiet-NaN prefix.
const KIND_MASK: u64 = 0x0003_0000_0000_0000;
const KIND_SINGLETON: u64 = 0x0000_0000_0000_0000;
const KIND_INT: u64 = 0x0001_0000_0000_0000;

/// Low 48 bits: integer payload or pointer address.
const PAYLOAD_MASK: u64 = 0x0000_ffff_ffff_ffff;

const NONE_BITS: u64 = QNAN | KIND_SINGLETON;
const FALSE_BITS: u64 = QNAN | KIND_SINGLETON | 1;
const TRUE_BITS: u64 = QNAN | KIND_SINGLETON | 2;
const ZERO_BITS: u64 = QNAN | KIND_INT;

/// The single NaN bit pattern stored for every NaN input.
const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// Smallest integer representable in the 48-bit payload.
pub const INT_MIN: i64 = -(1 << 47);
/// Largest integer representable in the 48-bit payload.
pub const INT_MAX: i64 = (1 << 47) - 1;

/// A NaN-boxed Opal value.
///
/// `Value` is a plain 64-bit word and is freely copyable. Object values are
/// opaque: this type carries the pointer but never dereferences it; object
/// lifetime is the collector's business.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct Value(u64);

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// The `none` singleton.
    #[inline]
    pub const fn none() -> Self {
        Value(NONE_BITS)
    }

    /// A boolean value.
    #[inline]
    pub const fn bool(b: bool) -> Self {
        if b { Value(TRUE_BITS) } else { Value(FALSE_BITS) }
    }

    /// A small integer, if it fits the 48-bit payload.
    ///
    /// Returns `None` for integers outside `[INT_MIN, INT_MAX]`; callers
    /// that need the full `i64` range must box.
    #[inline]
    pub fn int(i: i64) -> Option<Self> {
        if (INT_MIN..=INT_MAX).contains(&i) {
            Some(Self::int_unchecked(i))
        } else {
            None
        }
    }

    /// A small integer without the range check.
    ///
    /// Out-of-range inputs are silently truncated to 48 bits; use only when
    /// the range is already established.
    #[inline]
    pub fn int_unchecked(i: i64) -> Self {
        Value(QNAN | KIND_INT | (i as u64 & PAYLOAD_MASK))
    }

    /// A float value. NaN inputs are canonicalized so that no float bit
    /// pattern ever falls inside the tag space.
    #[inline]
    pub fn float(f: f64) -> Self {
        if f.is_nan() {
            Value(CANONICAL_NAN)
        } else {
            Value(f.to_bits())
        }
    }

    /// An object reference. The pointer is carried opaquely and never
    /// dereferenced by value code.
    ///
    /// The address must fit the 48-bit payload (true for canonical
    /// user-space addresses on x86-64 and AArch64).
    #[inline]
    pub fn object_ptr(ptr: *const ()) -> Self {
        debug_assert!(
            (ptr as u64 & !PAYLOAD_MASK) == 0,
            "object address exceeds 48-bit payload"
        );
        Value(SIGN | QNAN | (ptr as u64 & PAYLOAD_MASK))
    }

    /// The canonical zero scalar: integer `0`.
    ///
    /// This is the fill used for zero-initialized slot storage. It is *not*
    /// the all-zero word: that would decode as float `+0.0` and make the
    /// buffer look unboxed-numeric.
    #[inline]
    pub const fn zero() -> Self {
        Value(ZERO_BITS)
    }

    /// Reconstruct a value from its raw word.
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Value(bits)
    }

    // =========================================================================
    // Kind tests
    // =========================================================================

    /// True if this value is a float (anything outside the tag space).
    #[inline]
    pub fn is_float(self) -> bool {
        (self.0 & QNAN) != QNAN
    }

    /// True if this value is the `none` singleton.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == NONE_BITS
    }

    /// True if this value is a boolean.
    #[inline]
    pub fn is_bool(self) -> bool {
        self.0 == TRUE_BITS || self.0 == FALSE_BITS
    }

    /// True if this value is a small integer.
    #[inline]
    pub fn is_int(self) -> bool {
        (self.0 & (SIGN | QNAN | KIND_MASK)) == (QNAN | KIND_INT)
    }

    /// True if this value is an object reference.
    #[inline]
    pub fn is_object(self) -> bool {
        (self.0 & (SIGN | QNAN)) == (SIGN | QNAN)
    }

    /// True if this value is an immediate scalar: a representation that
    /// requires no heap allocation and no collector tracking (ints, floats,
    /// booleans, `none`).
    #[inline]
    pub fn is_immediate(self) -> bool {
        !self.is_object()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The raw 64-bit word.
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// The integer payload, if this is an int. Sign-extends from 48 bits.
    #[inline]
    pub fn as_int(self) -> Option<i64> {
        if self.is_int() {
            Some(((self.0 & PAYLOAD_MASK) << 16) as i64 >> 16)
        } else {
            None
        }
    }

    /// The float payload, if this is a float.
    #[inline]
    pub fn as_float(self) -> Option<f64> {
        if self.is_float() {
            Some(f64::from_bits(self.0))
        } else {
            None
        }
    }

    /// The boolean payload, if this is a boolean.
    #[inline]
    pub fn as_bool(self) -> Option<bool> {
        match self.0 {
            TRUE_BITS => Some(true),
            FALSE_BITS => Some(false),
            _ => None,
        }
    }

    /// The object pointer, if this is an object reference.
    #[inline]
    pub fn as_object_ptr(self) -> Option<*const ()> {
        if self.is_object() {
            Some((self.0 & PAYLOAD_MASK) as *const ())
        } else {
            None
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// True if both values are references to the same object.
    ///
    /// This is identity equality (equality of the stored address), never
    /// content equality. Two immediates are never `same_object`, even when
    /// their payloads are equal.
    #[inline]
    pub fn same_object(self, other: Self) -> bool {
        self.is_object() && self.0 == other.0
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(i) = self.as_int() {
            f.debug_tuple("Int").field(&i).finish()
        } else if let Some(x) = self.as_float() {
            f.debug_tuple("Float").field(&x).finish()
        } else if let Some(b) = self.as_bool() {
            f.debug_tuple("Bool").field(&b).finish()
        } else if self.is_none() {
            f.write_str("None")
        } else if let Some(p) = self.as_object_ptr() {
            f.debug_tuple("Object").field(&p).finish()
        } else {
            f.debug_tuple("Raw").field(&format_args!("{:#x}", self.0)).finish()
        }
    }
}
