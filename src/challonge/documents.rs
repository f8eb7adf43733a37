//! JSON:API envelopes returned by the Challonge v2.1 collection endpoints and
//! their mapping into flat domain records.
//!
//! Upstream renders identifiers as strings in most places and as numbers in a
//! few (`points_by_participant[].participant_id`). Every id is normalised to a
//! string on the way in so map keys compare as opaque text.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{Match, TournamentMatches, TournamentSnapshot};

/// Resource type tag of station records in a matches document's `included`.
const STATION_TYPE: &str = "station";

#[derive(Debug, Deserialize)]
pub struct Document<R> {
    #[serde(default = "Vec::new")]
    pub data: Vec<R>,
    #[serde(default)]
    pub included: Vec<Included>,
}

#[derive(Debug, Deserialize)]
pub struct Resource<A> {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub attributes: A,
}

#[derive(Debug, Default, Deserialize)]
pub struct TournamentAttributes {
    #[serde(default)]
    pub game_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantAttributes {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchResource {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub attributes: MatchAttributes,
    #[serde(default)]
    pub relationships: MatchRelationships,
}

#[derive(Debug, Default, Deserialize)]
pub struct MatchAttributes {
    #[serde(default)]
    pub round: Option<i32>,
    #[serde(default)]
    pub suggested_play_order: Option<i32>,
    #[serde(default)]
    pub points_by_participant: Vec<PointsByParticipant>,
    #[serde(default)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Deserialize)]
pub struct PointsByParticipant {
    #[serde(default, deserialize_with = "optional_opaque_id")]
    pub participant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timestamps {
    #[serde(default)]
    pub underway_at: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MatchRelationships {
    #[serde(default)]
    pub station: Option<Relationship>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<ResourceIdentifier>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
}

/// Side-loaded record. Only stations are read; other types keep raw attributes.
#[derive(Debug, Deserialize)]
pub struct Included {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
}

pub type TournamentsDocument = Document<Resource<TournamentAttributes>>;
pub type ParticipantsDocument = Document<Resource<ParticipantAttributes>>;
pub type MatchesDocument = Document<MatchResource>;

// ── Id normalisation ───────────────────────────────────────────────────────────

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| serde::de::Error::custom("id must be a string or number"))
}

fn optional_opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(id_from_value))
}

// ── Mapping ────────────────────────────────────────────────────────────────────

/// Merge one page of tournaments into `into` (tournament id → game name).
pub fn merge_tournament_page(page: TournamentsDocument, into: &mut HashMap<String, String>) {
    for tournament in page.data {
        into.insert(
            tournament.id,
            tournament.attributes.game_name.unwrap_or_default(),
        );
    }
}

/// Merge one page of participants into `into` (participant id → name).
pub fn merge_participant_page(page: ParticipantsDocument, into: &mut HashMap<String, String>) {
    for participant in page.data {
        into.insert(participant.id, participant.attributes.name.unwrap_or_default());
    }
}

/// Station id → display name, from the `included` side-array.
fn station_names(included: &[Included]) -> HashMap<&str, String> {
    included
        .iter()
        .filter(|inc| inc.kind == STATION_TYPE)
        .map(|inc| {
            let name = inc.attributes["name"].as_str().unwrap_or("").to_string();
            (inc.id.as_str(), name)
        })
        .collect()
}

/// Join a matches document against a tournament's roster and its stations.
/// The returned match list is ordered by suggested play order.
pub fn tournament_matches(
    snapshot: &TournamentSnapshot,
    doc: MatchesDocument,
) -> TournamentMatches {
    let stations = station_names(&doc.included);

    let player_name = |points: Option<&PointsByParticipant>| -> String {
        points
            .and_then(|p| p.participant_id.as_ref())
            .and_then(|id| snapshot.participant.get(id))
            .cloned()
            .unwrap_or_default()
    };

    let mut match_list: Vec<Match> = doc
        .data
        .iter()
        .map(|m| {
            let attrs = &m.attributes;
            let station = m
                .relationships
                .station
                .as_ref()
                .and_then(|rel| rel.data.as_ref())
                .and_then(|data| stations.get(data.id.as_str()))
                .cloned()
                .unwrap_or_default();

            Match {
                id: m.id.clone(),
                player1_name: player_name(attrs.points_by_participant.first()),
                player2_name: player_name(attrs.points_by_participant.get(1)),
                round: attrs.round.unwrap_or(0),
                suggested_play_order: attrs.suggested_play_order.unwrap_or(0),
                underway: attrs
                    .timestamps
                    .underway_at
                    .as_ref()
                    .is_some_and(|v| !v.is_null()),
                station,
            }
        })
        .collect();

    match_list.sort_by_key(|m| m.suggested_play_order);

    TournamentMatches {
        game_name: snapshot.game_name.clone(),
        tournament_id: snapshot.tournament_id.clone(),
        match_list,
    }
}
