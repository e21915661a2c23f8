use super::*;
use crate::database::ChunkMetadata;

fn result(content: &str) -> SearchResult {
    SearchResult {
        chunk_metadata: ChunkMetadata {
            filename: "a.txt".to_string(),
            chunk_index: 0,
            total_chunks: 1,
            content: content.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        },
        similarity_score: 0.9,
        distance: 0.1,
    }
}

#[test]
fn hit_after_insert() {
    let cache = QueryCache::new(4);
    let generation = cache.generation();

    assert!(cache.get("what", 3).is_none());
    assert!(cache.insert(generation, "what", 3, vec![result("alpha")]));

    let hit = cache.get("what", 3).expect("should be cached");
    assert_eq!(hit[0].chunk_metadata.content, "alpha");
}

#[test]
fn key_includes_result_count() {
    let cache = QueryCache::new(4);
    let generation = cache.generation();
    cache.insert(generation, "what", 3, vec![result("alpha")]);

    assert!(cache.get("what", 5).is_none());
}

#[test]
fn evicts_least_recently_used() {
    let cache = QueryCache::new(2);
    let generation = cache.generation();
    cache.insert(generation, "one", 1, vec![result("1")]);
    cache.insert(generation, "two", 1, vec![result("2")]);
    assert!(cache.get("one", 1).is_some());
    cache.insert(generation, "three", 1, vec![result("3")]);

    assert_eq!(cache.len(), 2);
    assert!(cache.get("two", 1).is_none());
    assert!(cache.get("one", 1).is_some());
    assert!(cache.get("three", 1).is_some());
}

#[test]
fn invalidate_empties_and_bumps_generation() {
    let cache = QueryCache::new(4);
    let before = cache.generation();
    cache.insert(before, "what", 3, vec![result("alpha")]);

    cache.invalidate();

    assert!(cache.is_empty());
    assert_eq!(cache.generation(), before + 1);
}

#[test]
fn stale_generation_is_not_inserted() {
    let cache = QueryCache::new(4);
    let stale = cache.generation();
    cache.invalidate();

    assert!(!cache.insert(stale, "what", 3, vec![result("old")]));
    assert!(cache.get("what", 3).is_none());
}

#[test]
fn zero_capacity_still_holds_one_entry() {
    let cache = QueryCache::new(0);
    let generation = cache.generation();
    cache.insert(generation, "a", 1, vec![]);
    cache.insert(generation, "b", 1, vec![]);

    assert_eq!(cache.len(), 1);
    assert!(cache.get("b", 1).is_some());
}
