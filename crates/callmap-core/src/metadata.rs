//! Joining known symbols against generated docs and the source store.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::enrich::orchestrator::DocumentationMaps;
use crate::indexer::inventory::SymbolInventory;
use crate::models::{
    bare_name, ClassMetadata, MethodMetadata, FAILED_TO_GENERATE, NO_CODE_PARSED,
};
use crate::store::source_table::SourceIndex;

pub type ClassMetadataMap = BTreeMap<String, ClassMetadata>;
pub type MethodMetadataMap = BTreeMap<String, MethodMetadata>;

/// Build one record per known class and per known method.
///
/// Class code is looked up by bare class name and left `None` on a miss.
/// Method code is looked up by (bare method name, bare owning class name)
/// and falls back to [`NO_CODE_PARSED`]. Missing documentation becomes
/// [`FAILED_TO_GENERATE`].
pub fn assemble_metadata(
    inventory: &SymbolInventory,
    docs: &DocumentationMaps,
    sources: &SourceIndex,
) -> (ClassMetadataMap, MethodMetadataMap) {
    let mut class_misses = 0usize;
    let class_metadata: ClassMetadataMap = inventory
        .classes
        .iter()
        .map(|class_key| {
            let code = sources.class_source(bare_name(class_key)).map(str::to_string);
            if code.is_none() {
                class_misses += 1;
            }
            let record = ClassMetadata {
                docstring: doc_or_sentinel(&docs.classes, class_key),
                code,
            };
            (class_key.clone(), record)
        })
        .collect();

    let mut method_misses = 0usize;
    let method_metadata: MethodMetadataMap = inventory
        .methods
        .iter()
        .map(|method_id| {
            let method_name = bare_name(method_id);
            let owner = inventory.class_of(method_id).map(bare_name).unwrap_or_default();
            let code = match sources.method_source(method_name, owner) {
                Some(code) => code.to_string(),
                None => {
                    debug!(method = %method_id, "no source row for method");
                    method_misses += 1;
                    NO_CODE_PARSED.to_string()
                }
            };
            let record = MethodMetadata {
                code,
                docstring: doc_or_sentinel(&docs.methods, method_id),
            };
            (method_id.clone(), record)
        })
        .collect();

    info!(
        classes = class_metadata.len(),
        methods = method_metadata.len(),
        class_misses,
        method_misses,
        "assembled metadata"
    );
    (class_metadata, method_metadata)
}

fn doc_or_sentinel(docs: &BTreeMap<String, String>, key: &str) -> String {
    docs.get(key)
        .cloned()
        .unwrap_or_else(|| FAILED_TO_GENERATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::inventory::parse_inventory;

    fn fixture() -> (SymbolInventory, DocumentationMaps, SourceIndex) {
        let inventory = parse_inventory(
            "<com.site.blog.AdminController: java.lang.String login(java.lang.String)>\n\
             <com.site.blog.AdminController: void logout()>\n\
             <com.site.blog.TagService: int count()>\n",
        );
        let mut docs = DocumentationMaps::default();
        docs.classes
            .insert("com.site.blog.AdminController".into(), "/** admin */".into());
        docs.methods.insert(
            "com.site.blog.AdminController.login".into(),
            "/** login */".into(),
        );
        let mut sources = SourceIndex::default();
        sources.insert_class("AdminController".into(), "class AdminController {}".into());
        sources.insert_method(
            "login".into(),
            "AdminController".into(),
            "String login(String p) {}".into(),
        );
        (inventory, docs, sources)
    }

    #[test]
    fn test_every_known_symbol_gets_a_record() {
        let (inventory, docs, sources) = fixture();
        let (classes, methods) = assemble_metadata(&inventory, &docs, &sources);
        assert_eq!(classes.len(), 2);
        assert_eq!(methods.len(), 3);
    }

    #[test]
    fn test_hits_carry_code_and_docs() {
        let (inventory, docs, sources) = fixture();
        let (classes, methods) = assemble_metadata(&inventory, &docs, &sources);
        let admin = &classes["com.site.blog.AdminController"];
        assert_eq!(admin.code.as_deref(), Some("class AdminController {}"));
        assert_eq!(admin.docstring, "/** admin */");
        let login = &methods["com.site.blog.AdminController.login"];
        assert_eq!(login.code, "String login(String p) {}");
        assert_eq!(login.docstring, "/** login */");
    }

    #[test]
    fn test_misses_use_sentinels() {
        let (inventory, docs, sources) = fixture();
        let (classes, methods) = assemble_metadata(&inventory, &docs, &sources);
        let tags = &classes["com.site.blog.TagService"];
        assert_eq!(tags.code, None);
        assert_eq!(tags.docstring, FAILED_TO_GENERATE);
        let logout = &methods["com.site.blog.AdminController.logout"];
        assert_eq!(logout.code, NO_CODE_PARSED);
        assert_eq!(logout.docstring, FAILED_TO_GENERATE);
    }

    #[test]
    fn test_method_lookup_uses_owning_class() {
        let (inventory, docs, mut sources) = fixture();
        sources.insert_method("count".into(), "OtherService".into(), "int count() {}".into());
        let (_, methods) = assemble_metadata(&inventory, &docs, &sources);
        assert_eq!(methods["com.site.blog.TagService.count"].code, NO_CODE_PARSED);
    }
}
