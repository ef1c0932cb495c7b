use crate::{
    error::{HdNodeError, Result},
    node::{HARDENED_OFFSET, HdNode, is_hardened},
};
use std::{fmt, str::FromStr};

/// A BIP-32 derivation path (e.g., "m/44'/0'/0'/0/1").
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(indices: Vec<u32>) -> Self {
        DerivationPath(indices)
    }
}

impl FromStr for DerivationPath {
    type Err = HdNodeError;

    /// Parses "m/44'/0'/0'/0/0", "m/44h/0H/0", or a bare "44/0/0/0/0".
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let rest = match s {
            "m" | "M" | "" => return Ok(DerivationPath::default()),
            _ => s
                .strip_prefix("m/")
                .or_else(|| s.strip_prefix("M/"))
                .unwrap_or(s),
        };

        rest.split('/')
            .map(|part| {
                let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                    Some(digits) => (digits, true),
                    None => (part, false),
                };
                // u32::from_str accepts a leading '+', path components don't.
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(HdNodeError::InvalidDerivationPath);
                }
                let index: u32 = digits
                    .parse()
                    .map_err(|_| HdNodeError::InvalidDerivationPath)?;
                if is_hardened(index) {
                    return Err(HdNodeError::InvalidDerivationPath);
                }
                Ok(if hardened { index | HARDENED_OFFSET } else { index })
            })
            .collect::<Result<Vec<_>>>()
            .map(DerivationPath)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for &index in &self.0 {
            if is_hardened(index) {
                write!(f, "/{}'", index & !HARDENED_OFFSET)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

impl HdNode {
    /// Walk `path` with private derivation. The node is left untouched on error.
    pub fn derive_path(&mut self, path: &DerivationPath) -> Result<()> {
        let mut node = self.clone();
        for &index in path.indices() {
            node.private_ckd(index)?;
        }
        *self = node;
        Ok(())
    }

    /// Walk `path` with public derivation (non-hardened indices only).
    pub fn derive_public_path(&mut self, path: &DerivationPath) -> Result<()> {
        let mut node = self.clone();
        for &index in path.indices() {
            node.public_ckd(index)?;
        }
        *self = node;
        Ok(())
    }
}
