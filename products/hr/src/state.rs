use platform_hal::{FieldDescriptor, Links, PageMetadata};

use crate::record::EmployeeResource;

pub const DEFAULT_PAGE_SIZE: u64 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
}

/// Everything the employee view renders. Replaced as a whole after each
/// completed fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub phase: LoadPhase,
    pub page: PageMetadata,
    pub employees: Vec<EmployeeResource>,
    pub attributes: Vec<FieldDescriptor>,
    pub page_size: u64,
    pub links: Links,
    /// Load generation that produced this state; 0 before the first load.
    pub generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: LoadPhase::Idle,
            page: PageMetadata::default(),
            employees: Vec::new(),
            attributes: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            links: Links::default(),
            generation: 0,
        }
    }
}

impl ViewState {
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .map(|field| field.name.as_str())
            .collect()
    }

    pub fn employee(&self, row: usize) -> Option<&EmployeeResource> {
        self.employees.get(row)
    }
}
