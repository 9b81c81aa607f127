//! Query-string filters for place lookups.
//!
//! Filters are parsed and validated here but evaluated by the index; the
//! remote index forwards them upstream as query pairs.

use thiserror::Error;

use crate::pipeline::QueryParams;
use crate::spr::Flag;
use crate::traits::FilterParser;

/// Placetypes understood by Who's On First indexes.
pub const PLACETYPES: &[&str] = &[
    "address",
    "arcology",
    "borough",
    "building",
    "campus",
    "concourse",
    "continent",
    "country",
    "county",
    "dependency",
    "disputed",
    "empire",
    "enclosure",
    "installation",
    "intersection",
    "localadmin",
    "locality",
    "macrocounty",
    "macrohood",
    "macroregion",
    "marinearea",
    "marketarea",
    "microhood",
    "neighbourhood",
    "ocean",
    "planet",
    "postalcode",
    "postalregion",
    "region",
    "timezone",
    "venue",
    "wing",
];

/// Existential flag parameters, in the order they are forwarded.
pub const FLAG_PARAMS: &[&str] = &[
    "is_current",
    "is_ceased",
    "is_deprecated",
    "is_superseded",
    "is_superseding",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid placetype '{0}'")]
    InvalidPlacetype(String),

    #[error("Invalid {param} value '{value}': expected -1, 0 or 1")]
    InvalidFlag { param: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceFilters {
    pub placetypes: Vec<String>,
    pub is_current: Option<Flag>,
    pub is_ceased: Option<Flag>,
    pub is_deprecated: Option<Flag>,
    pub is_superseded: Option<Flag>,
    pub is_superseding: Option<Flag>,
}

impl PlaceFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn flags(&self) -> [Option<Flag>; 5] {
        [
            self.is_current,
            self.is_ceased,
            self.is_deprecated,
            self.is_superseded,
            self.is_superseding,
        ]
    }

    fn flag_mut(&mut self, param: &str) -> Option<&mut Option<Flag>> {
        match param {
            "is_current" => Some(&mut self.is_current),
            "is_ceased" => Some(&mut self.is_ceased),
            "is_deprecated" => Some(&mut self.is_deprecated),
            "is_superseded" => Some(&mut self.is_superseded),
            "is_superseding" => Some(&mut self.is_superseding),
            _ => None,
        }
    }

    /// Renders the filters back into query pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .placetypes
            .iter()
            .map(|pt| ("placetype".to_string(), pt.clone()))
            .collect();

        for (param, flag) in FLAG_PARAMS.iter().zip(self.flags()) {
            if let Some(flag) = flag {
                pairs.push((param.to_string(), flag.to_string()));
            }
        }

        pairs
    }
}

/// Parses `placetype` and the existential flag parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFilterParser;

impl FilterParser for QueryFilterParser {
    type Filters = PlaceFilters;
    type Error = FilterError;

    fn parse(&self, params: &QueryParams) -> Result<PlaceFilters, FilterError> {
        let mut filters = PlaceFilters::default();

        for value in params.get_all("placetype") {
            for placetype in value.split(',').map(str::trim).filter(|pt| !pt.is_empty()) {
                if !PLACETYPES.contains(&placetype) {
                    return Err(FilterError::InvalidPlacetype(placetype.to_string()));
                }
                if !filters.placetypes.iter().any(|pt| pt == placetype) {
                    filters.placetypes.push(placetype.to_string());
                }
            }
        }

        for &param in FLAG_PARAMS {
            let Some(value) = params.get(param).filter(|v| !v.is_empty()) else {
                continue;
            };
            let flag = parse_flag(param, value)?;
            if let Some(slot) = filters.flag_mut(param) {
                *slot = Some(flag);
            }
        }

        Ok(filters)
    }
}

fn parse_flag(param: &'static str, value: &str) -> Result<Flag, FilterError> {
    match value.parse::<Flag>() {
        Ok(flag @ -1..=1) => Ok(flag),
        _ => Err(FilterError::InvalidFlag {
            param,
            value: value.to_string(),
        }),
    }
}
