//! Creative record repository.
//!
//! One database row per creative. Render outcomes fan out to every row
//! that references the finished slot, keyed by page id, so re-applying an
//! update converges instead of duplicating.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use adforge_models::{AdLabel, Creative, CreativeSet, CreativeStatus, RenderState, Tag};

use crate::client::NotionClient;
use crate::error::{NotionError, NotionResult};
use crate::properties::{build_checkbox, build_number, build_text, extract_bool, extract_number, extract_text};

/// Properties every target database must define.
pub const REQUIRED_PROPERTIES: [&str; 14] = [
    "Set ID",
    "Persona",
    "Market",
    "Funnel Stage",
    "Ad Label",
    "Language",
    "Headline",
    "Primary Text",
    "CTA",
    "Video ID",
    "Video URL",
    "Video Status",
    "Reused?",
    "Status",
];

/// Properties used when present, tolerated when absent.
pub const OPTIONAL_PROPERTIES: [&str; 3] = ["Tag", "Iteration", "Notes"];

/// Property types assumed when the database schema cannot be introspected.
pub fn default_property_types() -> HashMap<String, String> {
    let defaults = [
        ("Set ID", "title"),
        ("Persona", "rich_text"),
        ("Market", "rich_text"),
        ("Funnel Stage", "select"),
        ("Ad Label", "rich_text"),
        ("Language", "select"),
        ("Headline", "rich_text"),
        ("Primary Text", "rich_text"),
        ("CTA", "rich_text"),
        ("Video ID", "rich_text"),
        ("Video URL", "url"),
        ("Video Status", "select"),
        ("Reused?", "checkbox"),
        ("Status", "status"),
        ("Tag", "select"),
        ("Iteration", "number"),
        ("Notes", "rich_text"),
    ];
    defaults
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A render outcome to apply to a creative record.
#[derive(Debug, Clone)]
pub struct RenderUpdate {
    /// Render state to record
    pub state: RenderState,
    /// Clip URL, when completed
    pub video_url: Option<String>,
    /// Creative lifecycle status to record alongside, if it changes
    pub status: Option<CreativeStatus>,
}

/// Browse filter. The set filter is pushed to the store; funnel stage and
/// tag are applied client-side.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub set_id: Option<String>,
    pub stage: Option<String>,
    pub tag: Option<String>,
}

/// One creative record as stored, loosely typed for browsing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreativeCard {
    pub page_id: String,
    pub set_id: Option<String>,
    pub persona: Option<String>,
    pub market: Option<String>,
    pub funnel_stage: Option<String>,
    pub ad_label: Option<String>,
    pub language: Option<String>,
    pub headline: Option<String>,
    pub primary_text: Option<String>,
    pub cta: Option<String>,
    pub video_id: Option<String>,
    pub video_url: Option<String>,
    pub video_status: Option<String>,
    pub reused: bool,
    pub status: Option<String>,
    pub tag: Option<String>,
    pub iteration: u32,
    pub notes: Option<String>,
}

impl CreativeCard {
    /// Parse one page of query results.
    pub fn from_page(page: &Value) -> Self {
        let page_id = page
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let empty = Map::new();
        let props = page
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let text = |name: &str| props.get(name).and_then(extract_text);

        Self {
            page_id,
            set_id: text("Set ID"),
            persona: text("Persona"),
            market: text("Market"),
            funnel_stage: text("Funnel Stage"),
            ad_label: text("Ad Label"),
            language: text("Language"),
            headline: text("Headline"),
            primary_text: text("Primary Text"),
            cta: text("CTA"),
            video_id: text("Video ID"),
            video_url: text("Video URL"),
            video_status: text("Video Status"),
            reused: props.get("Reused?").and_then(extract_bool).unwrap_or(false),
            status: text("Status"),
            tag: text("Tag"),
            iteration: props
                .get("Iteration")
                .and_then(extract_number)
                .map(|n| n as u32)
                .unwrap_or(1),
            notes: text("Notes"),
        }
    }

    /// The typed label, when the stored value parses.
    pub fn label(&self) -> Option<AdLabel> {
        self.ad_label.as_deref().and_then(AdLabel::parse)
    }
}

/// Repository for creative records.
pub struct CreativeRepository {
    client: NotionClient,
}

impl CreativeRepository {
    /// Create a new creative repository.
    pub fn new(client: NotionClient) -> Self {
        Self { client }
    }

    /// Required property names absent from the database schema.
    pub async fn missing_properties(&self) -> NotionResult<Vec<String>> {
        let types = self.client.property_types().await?;
        Ok(REQUIRED_PROPERTIES
            .iter()
            .filter(|name| !types.contains_key(**name))
            .map(|name| name.to_string())
            .collect())
    }

    /// Create the record for one creative. Returns the record id.
    pub async fn create(&self, set: &CreativeSet, creative: &Creative) -> NotionResult<String> {
        let types = self.types_or_default().await;
        let properties = creative_properties(&types, set, creative)?;

        let page_id = self.client.create_page(properties).await?;
        info!(set_id = %set.set_id, label = %creative.label, "Created creative record");
        Ok(page_id)
    }

    /// Record a render outcome on a creative row.
    pub async fn apply_render_update(&self, page_id: &str, update: &RenderUpdate) -> NotionResult<()> {
        let types = self.types_or_default().await;
        let mut props = Map::new();

        put_text(&mut props, &types, "Video Status", update.state.as_str());
        if let Some(url) = &update.video_url {
            put_text(&mut props, &types, "Video URL", url);
        }
        if let Some(status) = update.status {
            put_text(&mut props, &types, "Status", status.as_str());
        }

        self.client.update_page(page_id, Value::Object(props)).await
    }

    /// Replace the copy fields after a regeneration.
    pub async fn update_copy(
        &self,
        page_id: &str,
        headline: &str,
        primary_text: &str,
        cta: &str,
        iteration: u32,
    ) -> NotionResult<()> {
        let types = self.types_or_default().await;
        let mut props = Map::new();

        put_text(&mut props, &types, "Headline", headline);
        put_text(&mut props, &types, "Primary Text", primary_text);
        put_text(&mut props, &types, "CTA", cta);
        put_text(&mut props, &types, "Status", CreativeStatus::Generated.as_str());
        if types.contains_key("Iteration") {
            props.insert("Iteration".to_string(), build_number(iteration));
        }

        self.client.update_page(page_id, Value::Object(props)).await
    }

    /// Set the review tag on a record.
    pub async fn update_tag(&self, page_id: &str, tag: Tag) -> NotionResult<()> {
        let types = self.types_or_default().await;
        let mut props = Map::new();
        put_text(&mut props, &types, "Tag", tag.as_str());

        if props.is_empty() {
            return Ok(());
        }
        self.client.update_page(page_id, Value::Object(props)).await
    }

    /// Set reviewer notes on a record.
    pub async fn update_notes(&self, page_id: &str, notes: &str) -> NotionResult<()> {
        let types = self.types_or_default().await;
        let mut props = Map::new();
        put_text(&mut props, &types, "Notes", notes);

        if props.is_empty() {
            return Ok(());
        }
        self.client.update_page(page_id, Value::Object(props)).await
    }

    /// Fetch one record by id.
    pub async fn get_card(&self, page_id: &str) -> NotionResult<CreativeCard> {
        let page = self.client.get_page(page_id).await?;
        Ok(CreativeCard::from_page(&page))
    }

    /// All records of one set.
    pub async fn query_set(&self, set_id: &str) -> NotionResult<Vec<CreativeCard>> {
        self.list_cards(&CardFilter {
            set_id: Some(set_id.to_string()),
            ..CardFilter::default()
        })
        .await
    }

    /// Browse records, newest first.
    pub async fn list_cards(&self, filter: &CardFilter) -> NotionResult<Vec<CreativeCard>> {
        let query_filter = match &filter.set_id {
            Some(set_id) => Some(self.set_id_filter(set_id).await?),
            None => None,
        };
        let sorts = json!([{"timestamp": "created_time", "direction": "descending"}]);

        let pages = self.client.query_database(query_filter, Some(sorts)).await?;
        let cards = pages.iter().map(CreativeCard::from_page).collect();
        Ok(filter_cards(cards, filter))
    }

    /// Distinct set ids, newest first.
    pub async fn list_set_ids(&self) -> NotionResult<Vec<String>> {
        let cards = self.list_cards(&CardFilter::default()).await?;

        let mut seen = Vec::new();
        for card in cards {
            if let Some(set_id) = card.set_id {
                if !set_id.is_empty() && !seen.contains(&set_id) {
                    seen.push(set_id);
                }
            }
        }
        Ok(seen)
    }

    /// The Set ID filter shape depends on the configured property type.
    async fn set_id_filter(&self, set_id: &str) -> NotionResult<Value> {
        let types = self.types_or_default().await;
        let filter = match types.get("Set ID").map(String::as_str) {
            Some("title") => json!({"property": "Set ID", "title": {"equals": set_id}}),
            _ => json!({"property": "Set ID", "rich_text": {"equals": set_id}}),
        };
        Ok(filter)
    }

    async fn types_or_default(&self) -> HashMap<String, String> {
        self.client
            .property_types()
            .await
            .unwrap_or_else(|_| default_property_types())
    }
}

/// Insert a text property when the schema knows its type.
fn put_text(props: &mut Map<String, Value>, types: &HashMap<String, String>, name: &str, value: &str) {
    if let Some(prop_type) = types.get(name) {
        props.insert(name.to_string(), build_text(prop_type, value));
    }
}

/// Build the full property payload for a new creative record.
pub fn creative_properties(
    types: &HashMap<String, String>,
    set: &CreativeSet,
    creative: &Creative,
) -> NotionResult<Value> {
    let missing: Vec<&str> = REQUIRED_PROPERTIES
        .iter()
        .copied()
        .filter(|name| !types.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(NotionError::MissingProperties(missing.join(", ")));
    }

    let mut props = Map::new();
    put_text(&mut props, types, "Set ID", set.set_id.as_str());
    put_text(&mut props, types, "Persona", &set.persona);
    put_text(&mut props, types, "Market", &set.market);
    put_text(&mut props, types, "Funnel Stage", creative.funnel_stage.as_str());
    put_text(&mut props, types, "Ad Label", creative.label.as_str());
    put_text(&mut props, types, "Language", creative.language.as_str());
    put_text(&mut props, types, "Headline", &creative.headline);
    put_text(&mut props, types, "Primary Text", &creative.primary_text);
    put_text(&mut props, types, "CTA", &creative.cta);
    put_text(&mut props, types, "Video ID", creative.video_slot.as_str());
    put_text(&mut props, types, "Video Status", RenderState::Queued.as_str());
    props.insert("Reused?".to_string(), build_checkbox(creative.reused));
    put_text(&mut props, types, "Status", creative.status.as_str());

    // Optional properties
    let tag = creative.tag.unwrap_or(Tag::Draft);
    put_text(&mut props, types, "Tag", tag.as_str());
    if types.contains_key("Iteration") {
        props.insert("Iteration".to_string(), build_number(creative.iteration));
    }
    if let Some(notes) = &creative.notes {
        put_text(&mut props, types, "Notes", notes);
    }

    Ok(Value::Object(props))
}

/// Apply client-side stage/tag filters. Untagged records count as Draft.
fn filter_cards(cards: Vec<CreativeCard>, filter: &CardFilter) -> Vec<CreativeCard> {
    cards
        .into_iter()
        .filter(|card| {
            if let Some(stage) = &filter.stage {
                if card.funnel_stage.as_deref() != Some(stage.as_str()) {
                    return false;
                }
            }
            if let Some(tag) = &filter.tag {
                let card_tag = card.tag.as_deref().unwrap_or("Draft");
                if card_tag != tag.as_str() {
                    return false;
                }
            }
            true
        })
        .collect()
}
