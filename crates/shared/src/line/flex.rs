//! Flex bubbles for the track search flow.

use serde_json::{Value, json};

use crate::spotify::{Track, TrackPage};

use super::events::PostbackCommand;
use super::messages::LineMessage;

const SPOTIFY_GREEN: &str = "#1DB954";
const SPOTIFY_BLACK: &str = "#191414";
const SPOTIFY_LOGO_URL: &str = "https://bcrm-i.line-scdn.net/bcrm/uploads/1557539795/public_asset/file/1039/16041313597470536_logo.png";

/// Postback `data` is capped at 300 characters by the platform.
const MAX_POSTBACK_TERMS_CHARS: usize = 100;

/// Builds the search result bubble, or `None` when the page is empty.
pub fn search_results(
    page: &TrackPage,
    terms: &str,
    skip: u32,
    limit: u32,
) -> Option<LineMessage> {
    if page.items.is_empty() {
        return None;
    }

    let mut tracks = page.items.iter().collect::<Vec<_>>();
    tracks.sort_by(|left, right| right.popularity.cmp(&left.popularity));

    let mut bubble = json!({
        "type": "bubble",
        "size": "giga",
        "header": {
            "type": "box",
            "layout": "horizontal",
            "contents": [
                {
                    "type": "image",
                    "url": SPOTIFY_LOGO_URL,
                    "align": "start",
                    "size": "xxs",
                    "flex": 0,
                    "aspectRatio": "4:3"
                },
                {
                    "type": "text",
                    "text": "Powered by Spotify",
                    "color": "#ffffff",
                    "size": "xxs",
                    "align": "end",
                    "gravity": "center"
                }
            ],
            "paddingAll": "10px"
        },
        "body": {
            "type": "box",
            "layout": "vertical",
            "contents": tracks.into_iter().map(track_row).collect::<Vec<_>>(),
            "backgroundColor": SPOTIFY_BLACK,
            "spacing": "md"
        },
        "styles": {
            "header": { "backgroundColor": SPOTIFY_GREEN }
        }
    });

    if page.has_more(skip, limit) {
        let next = PostbackCommand::SearchMore {
            terms: terms.chars().take(MAX_POSTBACK_TERMS_CHARS).collect(),
            skip: skip.saturating_add(limit),
            limit,
        };
        bubble["footer"] = more_button(&next);
    }

    Some(LineMessage::flex("Your Spotify search result", bubble))
}

pub fn track_added(playlist_name: &str) -> LineMessage {
    LineMessage::flex(
        "Thanks! Your track has been added.",
        json!({
            "type": "bubble",
            "size": "kilo",
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    {
                        "type": "text",
                        "contents": [
                            {
                                "type": "span",
                                "text": "Thanks! ",
                                "color": SPOTIFY_GREEN,
                                "weight": "bold",
                                "size": "md"
                            },
                            {
                                "type": "span",
                                "text": format!("Your track has been added to the {playlist_name} playlist 🎶"),
                                "color": SPOTIFY_BLACK
                            }
                        ],
                        "wrap": true
                    }
                ]
            },
            "styles": {
                "body": { "backgroundColor": "#FFFFFF" }
            }
        }),
    )
}

fn track_row(track: &Track) -> Value {
    let mut columns = Vec::with_capacity(3);

    let artwork_url = track.artwork_url();
    if !artwork_url.is_empty() {
        columns.push(json!({
            "type": "box",
            "layout": "vertical",
            "contents": [
                {
                    "type": "image",
                    "aspectRatio": "4:3",
                    "aspectMode": "cover",
                    "url": artwork_url
                }
            ],
            "flex": 0,
            "cornerRadius": "5px",
            "width": "30%"
        }));
    }

    columns.push(json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            {
                "type": "text",
                "size": "md",
                "color": SPOTIFY_GREEN,
                "weight": "bold",
                "text": track.name,
                "wrap": true
            },
            {
                "type": "text",
                "size": "xxs",
                "wrap": true,
                "color": "#FFFFFF",
                "text": track.artist_list()
            }
        ],
        "width": "40%"
    }));

    let add = PostbackCommand::AddTrack {
        track: track.id.clone(),
    };
    columns.push(json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            {
                "type": "button",
                "action": postback_action("Add", &add),
                "style": "primary",
                "gravity": "bottom",
                "color": SPOTIFY_GREEN,
                "height": "sm"
            }
        ],
        "width": "20%"
    }));

    json!({
        "type": "box",
        "layout": "horizontal",
        "contents": columns,
        "backgroundColor": SPOTIFY_BLACK,
        "spacing": "xl",
        "cornerRadius": "5px"
    })
}

fn more_button(command: &PostbackCommand) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            {
                "type": "button",
                "action": postback_action("More", command),
                "style": "secondary"
            }
        ],
        "backgroundColor": SPOTIFY_BLACK
    })
}

fn postback_action(label: &str, command: &PostbackCommand) -> Value {
    json!({
        "type": "postback",
        "label": label,
        "data": command.encode()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::line::{LineMessage, PostbackCommand};
    use crate::spotify::TrackPage;

    use super::{search_results, track_added};

    fn page(total: u32) -> TrackPage {
        serde_json::from_value(json!({
            "items": [
                {"id": "low", "name": "Low", "popularity": 10, "artists": [{"name": "A"}],
                 "album": {"images": []}},
                {"id": "high", "name": "High", "popularity": 90,
                 "artists": [{"name": "B"}, {"name": "C"}],
                 "album": {"images": [{"url": "https://img.test/a.jpg", "width": 300}]}}
            ],
            "total": total,
            "offset": 0,
            "limit": 2
        }))
        .expect("page should parse")
    }

    fn contents(message: LineMessage) -> Value {
        match message {
            LineMessage::Flex { contents, .. } => contents,
            other => panic!("expected flex message, got {other:?}"),
        }
    }

    fn button_data(row: &Value) -> PostbackCommand {
        let columns = row["contents"].as_array().expect("row columns");
        let data = columns
            .last()
            .and_then(|column| column["contents"][0]["action"]["data"].as_str())
            .expect("button data");
        PostbackCommand::parse(data).expect("postback should parse")
    }

    #[test]
    fn sorts_rows_by_popularity_and_attaches_add_buttons() {
        let bubble = contents(search_results(&page(2), "love", 0, 2).expect("message"));
        let rows = bubble["body"]["contents"].as_array().expect("rows");

        assert_eq!(rows.len(), 2);
        assert_eq!(
            button_data(&rows[0]),
            PostbackCommand::AddTrack {
                track: "high".to_string()
            }
        );
        assert_eq!(rows[0]["contents"][1]["contents"][1]["text"], "B, C");
        assert!(bubble.get("footer").is_none());
    }

    #[test]
    fn more_footer_carries_next_window() {
        let bubble = contents(search_results(&page(30), "love", 10, 10).expect("message"));
        let data = bubble["footer"]["contents"][0]["action"]["data"]
            .as_str()
            .expect("footer data");

        assert_eq!(
            PostbackCommand::parse(data),
            Some(PostbackCommand::SearchMore {
                terms: "love".to_string(),
                skip: 20,
                limit: 10
            })
        );
    }

    #[test]
    fn long_terms_are_clipped_in_postback_data() {
        let terms = "字".repeat(250);
        let bubble = contents(search_results(&page(30), &terms, 0, 2).expect("message"));
        let data = bubble["footer"]["contents"][0]["action"]["data"]
            .as_str()
            .expect("footer data");
        assert!(data.chars().count() <= 300);
    }

    #[test]
    fn empty_page_yields_no_message() {
        let empty: TrackPage = serde_json::from_value(json!({"items": [], "total": 0}))
            .expect("page should parse");
        assert!(search_results(&empty, "x", 0, 10).is_none());
    }

    #[test]
    fn confirmation_names_playlist() {
        let bubble = contents(track_added("LINE Jukebox"));
        assert_eq!(
            bubble["body"]["contents"][0]["contents"][1]["text"],
            "Your track has been added to the LINE Jukebox playlist 🎶"
        );
    }
}
