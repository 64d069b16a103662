//! Shared fixtures for unit tests

use crate::audit::Actor;
use crate::model::{Board, BoardImage, List};
use crate::{Config, Store, Taskboard};

pub fn actor() -> Actor {
    Actor {
        id: "user_1".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        image: "https://img.example/ada.png".into(),
    }
}

pub fn image() -> BoardImage {
    BoardImage {
        id: "img_1".into(),
        thumb_url: "https://images.example/thumb.jpg".into(),
        full_url: "https://images.example/full.jpg".into(),
        username: "photographer".into(),
        link_html: "https://images.example/photo".into(),
    }
}

pub fn taskboard() -> Taskboard {
    taskboard_with(Config::default())
}

pub fn taskboard_with(config: Config) -> Taskboard {
    Taskboard::new(Store::in_memory(), config)
}

/// A board of `org_1` with one list per title, in order
pub fn board_with_lists(tb: &Taskboard, titles: &[&str]) -> (Board, Vec<List>) {
    let board = tb.create_board(&actor(), "org_1", "Roadmap", image()).unwrap();
    let lists = titles
        .iter()
        .map(|t| tb.create_list(&actor(), &board.id, "org_1", t).unwrap())
        .collect();
    (board, lists)
}
