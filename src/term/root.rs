use std::fmt::Display;

use crate::GoError;

/// The top-level category a term belongs to
///
/// Every non-obsolete term that is reachable from one of the five root
/// terms is classified under that root. Terms that no root reaches stay
/// [`RootOntology::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RootOntology {
    /// Not classified
    #[default]
    None,
    /// `cellular_component`
    Cellular,
    /// `biological_process`
    Biological,
    /// `molecular_function`
    Molecular,
    /// `plant anatomical entity`
    PlantAnatomical,
    /// `plant structure development stage`
    PlantDev,
}

impl RootOntology {
    /// All classes that have a root term, in classification order
    pub const ROOTS: [RootOntology; 5] = [
        RootOntology::Cellular,
        RootOntology::Biological,
        RootOntology::Molecular,
        RootOntology::PlantAnatomical,
        RootOntology::PlantDev,
    ];

    /// Returns the name of the root term of the class
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::RootOntology;
    ///
    /// assert_eq!(RootOntology::Biological.root_name(), Some("biological_process"));
    /// assert_eq!(RootOntology::None.root_name(), None);
    /// ```
    pub fn root_name(&self) -> Option<&'static str> {
        match self {
            RootOntology::None => None,
            RootOntology::Cellular => Some("cellular_component"),
            RootOntology::Biological => Some("biological_process"),
            RootOntology::Molecular => Some("molecular_function"),
            RootOntology::PlantAnatomical => Some("plant anatomical entity"),
            RootOntology::PlantDev => Some("plant structure development stage"),
        }
    }

    /// Returns the class whose root term has the given name
    pub fn from_root_name(name: &str) -> Option<Self> {
        Self::ROOTS
            .into_iter()
            .find(|class| class.root_name() == Some(name))
    }

    /// Position of the class in per-class tables, `None` is `0`
    pub(crate) fn index(self) -> usize {
        self.as_u8() as usize
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            RootOntology::None => 0,
            RootOntology::Cellular => 1,
            RootOntology::Biological => 2,
            RootOntology::Molecular => 3,
            RootOntology::PlantAnatomical => 4,
            RootOntology::PlantDev => 5,
        }
    }
}

impl TryFrom<u8> for RootOntology {
    type Error = GoError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RootOntology::None),
            1 => Ok(RootOntology::Cellular),
            2 => Ok(RootOntology::Biological),
            3 => Ok(RootOntology::Molecular),
            4 => Ok(RootOntology::PlantAnatomical),
            5 => Ok(RootOntology::PlantDev),
            _ => Err(GoError::CorruptBinary("unknown root ontology")),
        }
    }
}

impl Display for RootOntology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root_name().unwrap_or("unclassified"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names() {
        for class in RootOntology::ROOTS {
            let name = class.root_name().unwrap();
            assert_eq!(RootOntology::from_root_name(name), Some(class));
        }
        assert!(RootOntology::from_root_name("All").is_none());
    }

    #[test]
    fn u8_conversion() {
        for class in RootOntology::ROOTS {
            assert_eq!(RootOntology::try_from(class.as_u8()).unwrap(), class);
        }
        assert_eq!(RootOntology::try_from(0).unwrap(), RootOntology::None);
        assert!(RootOntology::try_from(6).is_err());
    }
}
