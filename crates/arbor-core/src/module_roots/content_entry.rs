//! Content roots and the folders beneath them.

use xmltree::{Element, XMLNode};

use crate::utils::xml;

const URL_ATTR: &str = "url";
const FOLDER_ELEMENT: &str = "folder";
const FOLDER_TYPE_ATTR: &str = "type";

/// Role of a folder under a content root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFolderKind {
    Production,
    Test,
    Resource,
    TestResource,
    Excluded,
}

impl ContentFolderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFolderKind::Production => "production",
            ContentFolderKind::Test => "test",
            ContentFolderKind::Resource => "resource",
            ContentFolderKind::TestResource => "test-resource",
            ContentFolderKind::Excluded => "excluded",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "production" => Some(ContentFolderKind::Production),
            "test" => Some(ContentFolderKind::Test),
            "resource" => Some(ContentFolderKind::Resource),
            "test-resource" => Some(ContentFolderKind::TestResource),
            "excluded" => Some(ContentFolderKind::Excluded),
            _ => None,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, ContentFolderKind::Production | ContentFolderKind::Test)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, ContentFolderKind::Test | ContentFolderKind::TestResource)
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, ContentFolderKind::Excluded)
    }
}

/// One typed folder under a content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFolder {
    pub url: String,
    pub kind: ContentFolderKind,
}

/// One content root of a module root layer, identified by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    url: String,
    folders: Vec<ContentFolder>,
}

impl ContentEntry {
    pub const ELEMENT_NAME: &'static str = "content";

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            folders: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn folders(&self) -> &[ContentFolder] {
        &self.folders
    }

    pub fn add_folder(&mut self, url: impl Into<String>, kind: ContentFolderKind) -> &ContentFolder {
        self.folders.push(ContentFolder {
            url: url.into(),
            kind,
        });
        &self.folders[self.folders.len() - 1]
    }

    /// Returns whether a folder with the URL was present.
    pub fn remove_folder(&mut self, url: &str) -> bool {
        let before = self.folders.len();
        self.folders.retain(|folder| folder.url != url);
        self.folders.len() != before
    }

    pub fn folder_urls(&self, predicate: impl Fn(ContentFolderKind) -> bool) -> Vec<String> {
        self.folders
            .iter()
            .filter(|folder| predicate(folder.kind))
            .map(|folder| folder.url.clone())
            .collect()
    }

    /// Reads one `<content>` element. An entry without a URL is unusable
    /// and gets skipped with a warning; folders of unknown type likewise.
    pub fn read_external(element: &Element) -> Option<ContentEntry> {
        let Some(url) = xml::attr(element, URL_ATTR) else {
            log::warn!("content entry without url attribute");
            return None;
        };
        let mut entry = ContentEntry::new(url);
        for child in xml::child_elements(element).filter(|child| child.name == FOLDER_ELEMENT) {
            let Some(folder_url) = xml::attr(child, URL_ATTR) else {
                log::warn!("content folder without url attribute under '{url}'");
                continue;
            };
            let Some(kind) = xml::attr(child, FOLDER_TYPE_ATTR).and_then(ContentFolderKind::parse)
            else {
                log::warn!("content folder '{folder_url}' with unknown type");
                continue;
            };
            entry.add_folder(folder_url, kind);
        }
        Some(entry)
    }

    pub fn write_external(&self) -> Element {
        let mut element = Element::new(Self::ELEMENT_NAME);
        element
            .attributes
            .insert(URL_ATTR.to_string(), self.url.clone());
        for folder in &self.folders {
            let mut folder_element = Element::new(FOLDER_ELEMENT);
            folder_element
                .attributes
                .insert(URL_ATTR.to_string(), folder.url.clone());
            folder_element
                .attributes
                .insert(FOLDER_TYPE_ATTR.to_string(), folder.kind.as_str().to_string());
            element.children.push(XMLNode::Element(folder_element));
        }
        element
    }
}
