use tabled::Table;

use crate::{
    cli::{auth::spinner, new_hook, require_session},
    types::ArtistTableRow,
    warning,
};

/// Searches artists through the backend and prints them as a table, in the
/// order Spotify ranked them.
pub async fn search(backend_url: &str, query: &str) {
    let mut hook = new_hook(backend_url).await;
    if !require_session(&mut hook).await {
        return;
    }

    let pb = spinner("Searching artists...");
    let artists = hook.search_artists(query).await;
    pb.finish_and_clear();

    if artists.is_empty() {
        warning!("No artists found for \"{}\"", query);
        return;
    }

    let rows: Vec<ArtistTableRow> = artists
        .into_iter()
        .map(|a| ArtistTableRow {
            id: a.id,
            name: a.name,
        })
        .collect();

    println!("{}", Table::new(rows));
}
