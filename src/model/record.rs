use crate::model::{Datestamp, XmlFragment};

/// Header of one record: identity, datestamp and set membership
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// `status` attribute; only `deleted` is defined by the protocol
    pub status: Option<String>,
    pub identifier: String,
    pub datestamp: String,
    pub set_specs: Vec<String>,
}

impl Header {
    /// Returns true if the repository reports this record as deleted
    pub fn is_deleted(&self) -> bool {
        self.status.as_deref() == Some("deleted")
    }

    /// Parses the datestamp, if it is well formed
    pub fn datestamp(&self) -> Option<Datestamp> {
        Datestamp::parse(&self.datestamp)
    }
}

/// One metadata record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub header: Header,
    /// Inner XML of `<metadata>`; absent for deleted records
    pub metadata: Option<XmlFragment>,
    /// Inner XML of `<about>`
    pub about: Option<XmlFragment>,
    /// Inner XML of the whole `<record>` element
    pub raw: XmlFragment,
}

impl Record {
    /// Returns the record wrapped in its `<record>` element
    pub fn to_xml(&self) -> String {
        format!("<record>\n{}</record>\n", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_status() {
        let mut header = Header::default();
        assert!(!header.is_deleted());

        header.status = Some("deleted".to_string());
        assert!(header.is_deleted());
    }

    #[test]
    fn test_datestamp_parsing() {
        let header = Header {
            datestamp: "2020-01-02".to_string(),
            ..Header::default()
        };
        assert_eq!(header.datestamp().unwrap().to_string(), "2020-01-02");

        let broken = Header {
            datestamp: "02/01/2020".to_string(),
            ..Header::default()
        };
        assert!(broken.datestamp().is_none());
    }

    #[test]
    fn test_record_to_xml() {
        let record = Record {
            raw: XmlFragment::from("<header/>"),
            ..Record::default()
        };
        assert_eq!(record.to_xml(), "<record>\n<header/></record>\n");
    }
}
