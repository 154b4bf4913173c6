//! Hex rendering of stack contents for failure diagnostics.

use std::fmt;

/// Renders stack slots one per line as `\t{index}\t0x{value:08x}`.
///
/// Negative values print as their two's complement bits.
pub struct StackDump<'a>(pub &'a [i32]);

impl fmt::Display for StackDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, value) in self.0.iter().enumerate() {
            writeln!(f, "\t{index}\t0x{value:08x}")?;
        }
        Ok(())
    }
}
