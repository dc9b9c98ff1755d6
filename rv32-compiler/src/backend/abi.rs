use std::fmt;

/// The registers the backend touches. `t0..t6` form the allocatable file;
/// `a0` is the return-value register and, until the final `ret` move, the
/// exponentiation loop counter (the language has no calls, so nothing else
/// can clobber it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    A0,
}

impl Register {
    /// Allocation order is fixed; first-fit scans this array.
    pub const ALLOCATABLE: [Register; 7] = [
        Register::T0,
        Register::T1,
        Register::T2,
        Register::T3,
        Register::T4,
        Register::T5,
        Register::T6,
    ];

    pub const RETURN_REG: Register = Register::A0;
    pub const POW_COUNTER: Register = Register::A0;

    pub fn as_str(&self) -> &'static str {
        match self {
            Register::T0 => "t0",
            Register::T1 => "t1",
            Register::T2 => "t2",
            Register::T3 => "t3",
            Register::T4 => "t4",
            Register::T5 => "t5",
            Register::T6 => "t6",
            Register::A0 => "a0",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
