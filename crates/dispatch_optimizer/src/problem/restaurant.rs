use serde::Serialize;

use crate::define_index_newtype;

use super::location::Location;

define_index_newtype!(RestaurantIdx, Restaurant);

#[derive(Serialize, Debug, Clone)]
pub struct Restaurant {
    external_id: String,
    location: Option<Location>,
}

impl Restaurant {
    pub fn new(external_id: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            external_id: external_id.into(),
            location,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}
