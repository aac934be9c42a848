use crate::{
    cli::{ConsoleNotifier, auth::spinner, new_hook, require_session},
    client::PlayerHook,
    info, success, warning,
};

/// Plays a random top track of an artist.
///
/// `artist` is either a Spotify artist id (`by_id`) or a search query whose
/// best match is used.
pub async fn play_random(backend_url: &str, artist: &str, by_id: bool, device_id: Option<String>) {
    let mut hook = new_hook(backend_url).await;
    if !require_session(&mut hook).await {
        return;
    }
    if !attach_device(&mut hook, device_id).await {
        return;
    }

    let artist_id = if by_id {
        artist.to_string()
    } else {
        let pb = spinner("Searching artists...");
        let artists = hook.search_artists(artist).await;
        pb.finish_and_clear();

        let Some(best) = artists.into_iter().next() else {
            warning!("No artists found for \"{}\"", artist);
            return;
        };
        info!("Best match: {}", best.name);
        best.id
    };

    if let Some(track) = hook.play_random_track(&artist_id).await {
        success!("Now spinning \"{}\" by {}", track.name, track.artist_names());
    }
}

/// Pauses when playing, resumes otherwise.
pub async fn toggle(backend_url: &str, device_id: Option<String>) {
    let mut hook = new_hook(backend_url).await;
    if !require_session(&mut hook).await {
        return;
    }
    if !attach_device(&mut hook, device_id).await {
        return;
    }

    if let Some(result) = hook.toggle_play().await {
        if result.is_playing {
            success!("Playback resumed");
        } else {
            success!("Playback paused");
        }
    }
}

pub async fn now_playing(backend_url: &str) {
    let mut hook = new_hook(backend_url).await;
    if !require_session(&mut hook).await {
        return;
    }

    match hook.current_track().await {
        Some(current) => {
            let state = if current.is_playing { "Playing" } else { "Paused" };
            info!(
                "{}: \"{}\" by {}",
                state,
                current.track.name,
                current.track.artist_names()
            );
        }
        None => info!("Nothing is playing."),
    }
}

/// Routes playback to `device_id` when one is given.
async fn attach_device(hook: &mut PlayerHook<ConsoleNotifier>, device_id: Option<String>) -> bool {
    let Some(id) = device_id else {
        return true;
    };
    if !hook.connect_device(&id, "vinylspin").await {
        return false;
    }
    if let Some(device) = hook.device() {
        info!("Using device {} ({})", device.name(), device.id());
    }
    true
}
