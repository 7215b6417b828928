//! Node parser contract.
//!
//! Turning documents into nodes (chunking) is an external collaborator's
//! job; the core only invokes it from the document-level entry point.

use anyhow::Result;

use crate::node::{Document, Node};

/// Collaborator contract: documents in, nodes out.
pub trait NodeParser: Send + Sync {
    /// Decompose a batch of documents into nodes.
    fn parse(&self, documents: &[Document]) -> Result<Vec<Node>>;
}

/// Trivial parser producing one node per document.
///
/// Node ids are derived from the document id so repeated parses of the
/// same documents are stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeDocumentParser;

impl NodeParser for WholeDocumentParser {
    fn parse(&self, documents: &[Document]) -> Result<Vec<Node>> {
        Ok(documents
            .iter()
            .map(|doc| {
                Node::new(format!("{}#0", doc.id), doc.text.clone())
                    .with_metadata(doc.metadata.clone())
                    .with_ref_doc_id(doc.id.clone())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_document_parser() {
        let docs = vec![Document::new("d1", "cat"), Document::new("d2", "dog")];
        let nodes = WholeDocumentParser.parse(&docs).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "d1#0");
        assert_eq!(nodes[0].content, "cat");
        assert_eq!(nodes[0].ref_doc_id.as_deref(), Some("d1"));
        assert_eq!(nodes[1].id, "d2#0");
    }
}
