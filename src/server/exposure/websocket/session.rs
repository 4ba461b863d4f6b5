//! State of one live list view
//!
//! A [`LiveView`] owns the view inputs of a single socket and turns client
//! messages and snapshots into [`ServerMessage`]s. It does no I/O, so the
//! socket loop stays a thin shell around it.

use super::protocol::{ClientMessage, ServerMessage};
use crate::config::{CollectionConfig, PaginationConfig};
use crate::core::record::Record;
use crate::core::view::{FlagFilter, ListFields, SortKey, ViewState};
use crate::server::exposure::rest::records::present;

/// What the socket loop should do after a client message
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// View inputs changed; render the latest snapshot again
    Render,
    /// Send this message without rendering
    Send(ServerMessage),
}

pub struct LiveView {
    collection: CollectionConfig,
    fields: ListFields,
    pagination: PaginationConfig,
    state: ViewState,
}

impl LiveView {
    pub fn new(collection: CollectionConfig, pagination: PaginationConfig) -> Self {
        let state = ViewState::new(pagination.default_page_size);
        Self {
            fields: collection.list_fields(),
            collection,
            pagination,
            state,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Apply a client message to the view inputs
    pub fn apply(&mut self, msg: ClientMessage) -> Reply {
        match msg {
            ClientMessage::SetFilter { text } => {
                self.state.set_filter(&text);
                Reply::Render
            }
            ClientMessage::SetSort { sort } => {
                let key = self.collection.offered_sort(SortKey::parse(&sort));
                self.state.set_sort(key);
                Reply::Render
            }
            ClientMessage::SetPage { page } => {
                self.state.set_page(page);
                Reply::Render
            }
            ClientMessage::SetPageSize { page_size } => {
                if !self.pagination.is_allowed(page_size) {
                    return Reply::Send(ServerMessage::Error {
                        message: format!(
                            "Page size must be one of {:?}",
                            self.pagination.allowed_page_sizes
                        ),
                    });
                }
                self.state.set_page_size(page_size);
                Reply::Render
            }
            ClientMessage::SetStatus { status } => {
                self.state.set_flag(FlagFilter::parse(&status));
                Reply::Render
            }
            ClientMessage::Ping => Reply::Send(ServerMessage::Pong),
        }
    }

    /// Render the current page of `snapshot`
    ///
    /// Keeps the clamped page number, so a shrinking snapshot moves the view
    /// back to its last page.
    pub fn render(&mut self, snapshot: &[Record]) -> ServerMessage {
        let page = self.state.render(snapshot, &self.fields);
        ServerMessage::View {
            collection: self.collection.name.clone(),
            filter: self.state.filter_text().to_string(),
            sort: self.state.sort_key().as_str().to_string(),
            status: self.state.flag(),
            data: page
                .data
                .iter()
                .map(|record| present(&self.collection.name, record))
                .collect(),
            pagination: page.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortalConfig;
    use crate::core::record::Fields;
    use serde_json::json;

    fn live(collection: &str) -> LiveView {
        let config = PortalConfig::default_config();
        LiveView::new(
            config.collection(collection).unwrap().clone(),
            config.pagination.clone(),
        )
    }

    fn exams(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                let mut fields = Fields::new();
                fields.insert("title".to_string(), json!(format!("Exam {}", i)));
                fields.insert("createdAt".to_string(), json!(1_000 + i as i64));
                Record::new(fields)
            })
            .rev()
            .collect()
    }

    fn pagination(msg: &ServerMessage) -> crate::core::query::PaginationMeta {
        match msg {
            ServerMessage::View { pagination, .. } => *pagination,
            other => panic!("expected a view, got {:?}", other),
        }
    }

    #[test]
    fn test_initial_render_is_first_page_newest() {
        let mut view = live("exams");
        let msg = view.render(&exams(25));

        let ServerMessage::View { data, sort, .. } = &msg else {
            panic!("expected a view");
        };
        assert_eq!(sort, "newest");
        assert_eq!(data.len(), 10);
        assert_eq!(data[0]["title"], "Exam 24");
        assert_eq!(pagination(&msg).total_pages, 3);
    }

    #[test]
    fn test_shrinking_snapshot_clamps_page() {
        let mut view = live("exams");
        view.apply(ClientMessage::SetPage { page: 3 });
        assert_eq!(pagination(&view.render(&exams(25))).page, 3);

        let msg = view.render(&exams(5));
        assert_eq!(pagination(&msg).page, 1);
        assert_eq!(pagination(&msg).total, 5);
        assert_eq!(view.state().page(), 1);
    }

    #[test]
    fn test_filter_resets_page() {
        let mut view = live("exams");
        view.apply(ClientMessage::SetPage { page: 2 });
        view.render(&exams(25));

        assert_eq!(
            view.apply(ClientMessage::SetFilter {
                text: "EXAM 1".to_string()
            }),
            Reply::Render
        );
        let msg = view.render(&exams(25));
        assert_eq!(pagination(&msg).page, 1);
        // "Exam 1" and "Exam 10".."Exam 19"
        assert_eq!(pagination(&msg).total, 11);
    }

    #[test]
    fn test_rejected_page_size_keeps_state() {
        let mut view = live("exams");
        let reply = view.apply(ClientMessage::SetPageSize { page_size: 7 });
        assert!(matches!(reply, Reply::Send(ServerMessage::Error { .. })));
        assert_eq!(view.state().page_size(), 10);

        assert_eq!(
            view.apply(ClientMessage::SetPageSize { page_size: 25 }),
            Reply::Render
        );
        assert_eq!(pagination(&view.render(&exams(25))).total_pages, 1);
    }

    #[test]
    fn test_sort_falls_back_to_offered_key() {
        let mut view = live("notes");
        view.apply(ClientMessage::SetSort {
            sort: "dateAsc".to_string(),
        });
        assert_eq!(view.state().sort_key(), SortKey::Newest);

        view.apply(ClientMessage::SetSort {
            sort: "oldest".to_string(),
        });
        assert_eq!(view.state().sort_key(), SortKey::Oldest);
    }

    #[test]
    fn test_ping() {
        let mut view = live("banners");
        assert_eq!(
            view.apply(ClientMessage::Ping),
            Reply::Send(ServerMessage::Pong)
        );
    }
}
