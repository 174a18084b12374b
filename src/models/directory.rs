// Directory entries: sites (one canonical address) and groups (many member addresses)

/// A named site backed by one canonical monitoring address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    /// `None` when the directory has no monitoring address configured.
    pub address: Option<String>,
}

impl Site {
    /// Report label: `name(address)`, with an empty address when none is configured.
    pub fn label(&self) -> String {
        format!("{}({})", self.name, self.address.as_deref().unwrap_or(""))
    }
}

/// A named group whose member addresses are summed for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub site_name: String,
    /// Real addresses; these are the series that get summed.
    pub members: Vec<String>,
    /// Virtual addresses, carried for completeness but never summed.
    pub virtual_addresses: Vec<String>,
}

impl Group {
    pub fn label(&self) -> String {
        format!("{}({})", self.name, self.site_name)
    }
}
