//! Kernel error numbers.
//!
//! Subsystems report failures through their own error enums and map them
//! onto these values at the boundary, where callers expect a negative errno.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Errno(i32);

impl Errno {
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// The value returned across the syscall/loader boundary.
    #[must_use]
    pub const fn as_negative(self) -> isize {
        -(self.0 as isize)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            ENOENT => "ENOENT",
            ENOMEM => "ENOMEM",
            EACCES => "EACCES",
            EFAULT => "EFAULT",
            EBUSY => "EBUSY",
            ENODEV => "ENODEV",
            ENOTDIR => "ENOTDIR",
            EINVAL => "EINVAL",
            EAGAIN => "EAGAIN",
            ENOPKG => "ENOPKG",
            EBADMSG => "EBADMSG",
            EOPNOTSUPP => "EOPNOTSUPP",
            ENOKEY => "ENOKEY",
            EKEYEXPIRED => "EKEYEXPIRED",
            EKEYREVOKED => "EKEYREVOKED",
            EKEYREJECTED => "EKEYREJECTED",
            _ => return write!(f, "errno {}", self.0),
        };
        f.write_str(name)
    }
}

pub const ENOENT: Errno = Errno(2);
pub const EAGAIN: Errno = Errno(11);
pub const ENOMEM: Errno = Errno(12);
pub const EACCES: Errno = Errno(13);
pub const EFAULT: Errno = Errno(14);
pub const EBUSY: Errno = Errno(16);
pub const ENODEV: Errno = Errno(19);
pub const ENOTDIR: Errno = Errno(20);
pub const EINVAL: Errno = Errno(22);
pub const ENOPKG: Errno = Errno(65);
pub const EBADMSG: Errno = Errno(74);
pub const EOPNOTSUPP: Errno = Errno(95);
pub const ENOKEY: Errno = Errno(126);
pub const EKEYEXPIRED: Errno = Errno(127);
pub const EKEYREVOKED: Errno = Errno(128);
pub const EKEYREJECTED: Errno = Errno(129);

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::string::ToString;

    use super::*;

    #[test]
    fn negative_form() {
        assert_eq!(EKEYREJECTED.as_negative(), -129);
        assert_eq!(EBUSY.as_i32(), 16);
    }

    #[test]
    fn display_names() {
        assert_eq!(EBADMSG.to_string(), "EBADMSG");
        assert_eq!(Errno::new(4095).to_string(), "errno 4095");
    }
}
