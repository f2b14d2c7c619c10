//! # Global point table

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use delta_if::motion::GlobalPoint;

use super::StoreError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest valid point number.
pub const POINT_MIN: i64 = 1;

/// Highest valid point number.
pub const POINT_MAX: i64 = 1000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PointTable {
    points: BTreeMap<i64, GlobalPoint>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reference to a global point, either by number or by the name it was defined with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointRef {
    Num(i64),
    Name(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PointTable {
    /// Define or overwrite a point.
    pub fn set(&mut self, num: i64, point: GlobalPoint) -> Result<(), StoreError> {
        check_num(num)?;

        if !point.pose.is_finite() {
            return Err(StoreError::InvalidArgument(format!(
                "point {} has non-finite coordinates",
                num
            )));
        }

        self.points.insert(num, point);
        Ok(())
    }

    /// Resolve a reference to its point number and definition.
    ///
    /// Numbers outside the valid range are rejected before the table is consulted. Name lookups
    /// return the lowest numbered point with that name.
    pub fn get(&self, point: &PointRef) -> Result<(i64, &GlobalPoint), StoreError> {
        match point {
            PointRef::Num(num) => {
                check_num(*num)?;
                self.points
                    .get(num)
                    .map(|p| (*num, p))
                    .ok_or_else(|| StoreError::PointNotFound(point.clone()))
            }
            PointRef::Name(name) => self
                .points
                .iter()
                .find(|(_, p)| &p.name == name)
                .map(|(n, p)| (*n, p))
                .ok_or_else(|| StoreError::PointNotFound(point.clone())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &GlobalPoint)> {
        self.points.iter().map(|(n, p)| (*n, p))
    }
}

impl From<i64> for PointRef {
    fn from(num: i64) -> Self {
        PointRef::Num(num)
    }
}

impl From<&str> for PointRef {
    fn from(name: &str) -> Self {
        PointRef::Name(name.to_string())
    }
}

impl fmt::Display for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRef::Num(n) => write!(f, "{}", n),
            PointRef::Name(s) => write!(f, "\"{}\"", s),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_num(num: i64) -> Result<(), StoreError> {
    if (POINT_MIN..=POINT_MAX).contains(&num) {
        Ok(())
    } else {
        Err(StoreError::OutOfRange {
            what: "point number",
            value: num,
            min: POINT_MIN,
            max: POINT_MAX,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use delta_if::motion::Pose;

    fn point(name: &str, x: f64) -> GlobalPoint {
        GlobalPoint {
            name: name.into(),
            pose: Pose {
                x,
                ..Default::default()
            },
            extra: vec![],
        }
    }

    #[test]
    fn test_define_and_lookup() {
        let mut table = PointTable::default();

        table.set(1, point("GL_P1", 200.0)).unwrap();
        table.set(5, point("HOME", 0.0)).unwrap();

        assert_eq!(table.get(&1.into()).unwrap().1.pose.x, 200.0);
        assert_eq!(table.get(&"HOME".into()).unwrap().0, 5);

        table.set(1, point("GL_P1", -50.0)).unwrap();
        assert_eq!(table.get(&1.into()).unwrap().1.pose.x, -50.0);
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn test_range_before_lookup() {
        let mut table = PointTable::default();

        assert!(matches!(
            table.get(&1001.into()),
            Err(StoreError::OutOfRange { value: 1001, .. })
        ));
        assert!(matches!(
            table.get(&999.into()),
            Err(StoreError::PointNotFound(PointRef::Num(999)))
        ));
        assert!(matches!(
            table.get(&"NOWHERE".into()),
            Err(StoreError::PointNotFound(_))
        ));
        assert!(table.set(0, point("ZERO", 0.0)).is_err());
        assert!(matches!(
            table.set(2, point("BAD", f64::NAN)),
            Err(StoreError::InvalidArgument(_))
        ));
    }
}
