use serde_derive::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    name: String,
    url: String,
    r#type: LinkType,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LinkType {
    Issue,
    Tms,
    Custom,
}

impl Link {
    pub fn new(name: String, url: String, r#type: LinkType) -> Self {
        Self { name, url, r#type }
    }

    pub fn issue(name: String, url: String) -> Self {
        Self::new(name, url, LinkType::Issue)
    }

    pub fn tms(name: String, url: String) -> Self {
        Self::new(name, url, LinkType::Tms)
    }

    pub fn custom(name: String, url: String) -> Self {
        Self::new(name, url, LinkType::Custom)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn link_type(&self) -> LinkType {
        self.r#type
    }
}
