#![allow(dead_code)]

use engine_config::settings::StreamSettings;
use engine_runtime::{memory::MemoryNode, node::Node};
use model::core::{location::Namespace, object::RiakObject};
use serde_json::json;
use std::{sync::Arc, time::Duration};

pub mod utils;

pub const USERS_BUCKET: &str = "users";
pub const USER_COUNT: i64 = 250;

fn users() -> Namespace {
    Namespace::bucket(USERS_BUCKET)
}

/// Settings with a short poll interval so that tests never sit on a
/// half-second wait.
fn test_settings(page_size: usize, queue_capacity: usize) -> StreamSettings {
    StreamSettings::builder()
        .page_size(page_size)
        .queue_capacity(queue_capacity)
        .poll_timeout(Duration::from_millis(25))
        .build()
        .unwrap()
}

/// A node holding `USER_COUNT` users keyed `user-000`.. with an `age_int`
/// index cycling through 20..=69 and a `tier_bin` index.
async fn populated_node() -> MemoryNode {
    let node = MemoryNode::new("riak@test");
    for i in 0..USER_COUNT {
        let key = format!("user-{i:03}");
        let tier = if i % 10 == 0 { "gold" } else { "basic" };
        let object = RiakObject::json(&json!({ "id": i, "tier": tier }))
            .unwrap()
            .with_index("age_int", 20 + i % 50)
            .with_index("tier_bin", tier);
        node.insert(users().location(key), object).await;
    }
    node
}

async fn shared_node() -> Arc<dyn Node> {
    Arc::new(populated_node().await)
}
