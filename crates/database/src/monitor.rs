use mongodb::event::sdam::{SdamEvent, TopologyDescription};
use mongodb::event::EventHandler;
use mongodb::ServerType;
use std::sync::{Arc, Mutex};

/// Called with a human-readable reason when the deployment stops having any
/// usable server.
pub type DisconnectHook = Arc<dyn Fn(String) + Send + Sync>;

/// Wraps `hook` in an SDAM event handler.
///
/// A single member failing its heartbeat is not a disconnect: on a replica set
/// the rest keep serving. The hook fires only when a topology change takes the
/// deployment from at least one data-bearing server to none. The most recent
/// heartbeat failure, if any, becomes the reason.
pub fn disconnect_handler(hook: DisconnectHook) -> EventHandler<SdamEvent> {
    let last_failure = Mutex::new(None::<String>);
    EventHandler::callback(move |event: SdamEvent| match event {
        SdamEvent::ServerHeartbeatFailed(failed) => {
            let reason = format!("{} ({})", failed.failure, failed.server_address);
            tracing::debug!(%reason, "Server heartbeat failed.");
            if let Ok(mut last) = last_failure.lock() {
                *last = Some(reason);
            }
        }
        SdamEvent::TopologyDescriptionChanged(changed) => {
            let was_usable = has_data_bearing_server(&changed.previous_description);
            let is_usable = has_data_bearing_server(&changed.new_description);
            if lost_last_server(was_usable, is_usable) {
                let reason = last_failure
                    .lock()
                    .ok()
                    .and_then(|last| last.clone())
                    .unwrap_or_else(|| "no available servers".to_string());
                hook(reason);
            }
        }
        _ => {}
    })
}

fn has_data_bearing_server(description: &TopologyDescription) -> bool {
    description
        .servers()
        .values()
        .any(|server| is_data_bearing(server.server_type()))
}

/// Servers that can answer a command. Arbiters, ghosts and unknowns cannot.
fn is_data_bearing(server_type: ServerType) -> bool {
    matches!(
        server_type,
        ServerType::Standalone
            | ServerType::Mongos
            | ServerType::RsPrimary
            | ServerType::RsSecondary
            | ServerType::LoadBalancer
    )
}

fn lost_last_server(was_usable: bool, is_usable: bool) -> bool {
    was_usable && !is_usable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_data_bearing_members_count() {
        assert!(is_data_bearing(ServerType::RsPrimary));
        assert!(is_data_bearing(ServerType::RsSecondary));
        assert!(is_data_bearing(ServerType::Standalone));
        assert!(!is_data_bearing(ServerType::RsArbiter));
        assert!(!is_data_bearing(ServerType::Unknown));
    }

    #[test]
    fn fires_only_on_losing_the_last_server() {
        assert!(lost_last_server(true, false));
        // One secondary dropping out while another member serves.
        assert!(!lost_last_server(true, true));
        // Still down, or never came up.
        assert!(!lost_last_server(false, false));
        assert!(!lost_last_server(false, true));
    }
}
