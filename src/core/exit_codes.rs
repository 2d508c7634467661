//! Exit codes with a meaning beyond plain success/failure.
//!
//! The package manager reports several "nothing to do" outcomes as non-zero
//! HRESULT-style codes. Those are treated as success when installing.

pub const SUCCESS: i32 = 0;

/// Recorded when the invocation itself failed and no native code exists.
pub const INVOCATION_ERROR: i32 = -1;

/// 0x8A15002B: no applicable update found.
pub const UPDATE_NOT_APPLICABLE: i32 = 0x8A15_002B_u32 as i32;

/// 0x8A150061: package already installed.
pub const PACKAGE_ALREADY_INSTALLED: i32 = 0x8A15_0061_u32 as i32;

/// 0x8A15010D: installer reports the application is already installed.
pub const INSTALL_ALREADY_INSTALLED: i32 = 0x8A15_010D_u32 as i32;

/// 0x8A150014: a query matched no installed package. Only meaningful for
/// inventory queries, never an install outcome.
pub const NO_PACKAGES_FOUND: i32 = 0x8A15_0014_u32 as i32;

pub const NOOP_SUCCESS_CODES: [i32; 3] = [
    UPDATE_NOT_APPLICABLE,
    PACKAGE_ALREADY_INSTALLED,
    INSTALL_ALREADY_INSTALLED,
];

pub fn is_noop_success(code: i32) -> bool {
    NOOP_SUCCESS_CODES.contains(&code)
}

pub fn is_install_success(code: i32) -> bool {
    code == SUCCESS || is_noop_success(code)
}
