use std::fmt;

/// Which parts of the conversion the last operation touched.
///
/// Displayed as `S` (segmentation), `C` (candidates), both, or `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeState {
    pub segments: bool,
    pub candidates: bool,
}

impl ChangeState {
    pub const NONE: ChangeState = ChangeState {
        segments: false,
        candidates: false,
    };
    pub const ALL: ChangeState = ChangeState {
        segments: true,
        candidates: true,
    };
    pub const CANDIDATES: ChangeState = ChangeState {
        segments: false,
        candidates: true,
    };

    pub fn is_changed(self) -> bool {
        self.segments || self.candidates
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_changed() {
            return f.write_str("-");
        }
        if self.segments {
            f.write_str("S")?;
        }
        if self.candidates {
            f.write_str("C")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(ChangeState::ALL.to_string(), "SC");
        assert_eq!(ChangeState::CANDIDATES.to_string(), "C");
        assert_eq!(
            ChangeState {
                segments: true,
                candidates: false
            }
            .to_string(),
            "S"
        );
        assert_eq!(ChangeState::NONE.to_string(), "-");
    }
}
