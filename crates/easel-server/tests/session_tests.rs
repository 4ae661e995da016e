//! End-to-end WebSocket session tests
//!
//! Exercises the full path: handshake gate, connection registry, ordered
//! pipeline, edit-lock state machine, broadcast fan-out. Cross-connection
//! ordering is established through observed broadcasts, never through
//! sleeps.

use easel_access::{
    role, Asset, AssetId, Container, ContainerId, ContainerKind, PermissionResolver, Principal,
    PrincipalId,
};
use easel_server::config::ServerConfig;
use easel_server::directory::{MemoryDirectory, MemoryIdentity, MemoryMembership};
use easel_server::gate::HandshakeGate;
use easel_server::server::CollabServer;
use std::sync::Arc;
use warp::test::WsClient;

fn server() -> CollabServer {
    let identity = Arc::new(MemoryIdentity::new());
    identity.insert("alice", Principal::new(1, "alice"));
    identity.insert("bob", Principal::new(2, "bob"));
    identity.insert("vera", Principal::new(3, "vera"));

    let directory = Arc::new(MemoryDirectory::new());
    directory.insert_container(Container::new(10, 1, ContainerKind::Shared));
    directory.insert_container(Container::new(11, 1, ContainerKind::Exclusive));
    directory.insert_asset(Asset::in_container(1, 10));
    directory.insert_asset(Asset::in_container(2, 11));

    let membership = Arc::new(MemoryMembership::new());
    membership.grant(ContainerId(10), PrincipalId(1), role::EDITOR);
    membership.grant(ContainerId(10), PrincipalId(2), role::EDITOR);
    membership.grant(ContainerId(10), PrincipalId(3), role::VIEWER);

    let gate = HandshakeGate::new(
        identity,
        directory,
        membership,
        PermissionResolver::with_builtin_roles(),
    );
    CollabServer::new(gate, &ServerConfig::new())
}

async fn connect(server: &CollabServer, asset: u64, token: &str) -> WsClient {
    warp::test::ws()
        .path(&format!("/ws/asset/edit?assetId={asset}"))
        .header("authorization", token)
        .handshake(server.routes())
        .await
        .expect("handshake accepted")
}

async fn recv_json(client: &mut WsClient) -> serde_json::Value {
    let message = client.recv().await.expect("frame");
    serde_json::from_str(message.to_str().expect("text frame")).expect("valid json")
}

#[tokio::test]
async fn handshake_requires_asset_parameter() {
    let server = server();
    let result = warp::test::ws()
        .path("/ws/asset/edit")
        .header("authorization", "alice")
        .handshake(server.routes())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn handshake_requires_known_token() {
    let server = server();
    let result = warp::test::ws()
        .path("/ws/asset/edit?assetId=1")
        .header("authorization", "intruder")
        .handshake(server.routes())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn exclusive_container_rejected_even_for_owner() {
    let server = server();
    // alice owns container 11; sessions are still shared-container only.
    let result = warp::test::ws()
        .path("/ws/asset/edit?assetId=2")
        .header("authorization", "alice")
        .handshake(server.routes())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn viewer_role_rejected_editor_accepted() {
    let server = server();
    let rejected = warp::test::ws()
        .path("/ws/asset/edit?assetId=1")
        .header("authorization", "vera")
        .handshake(server.routes())
        .await;
    assert!(rejected.is_err());

    let mut accepted = connect(&server, 1, "alice").await;
    let joined = recv_json(&mut accepted).await;
    assert_eq!(joined["type"], "INFO");
    assert_eq!(joined["user"]["id"], "1");
}

#[tokio::test]
async fn token_query_parameter_also_authenticates() {
    let server = server();
    let result = warp::test::ws()
        .path("/ws/asset/edit?assetId=1&token=alice")
        .handshake(server.routes())
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn lock_race_and_action_forwarding() {
    let server = server();
    let mut alice = connect(&server, 1, "alice").await;
    assert_eq!(recv_json(&mut alice).await["type"], "INFO");

    let mut bob = connect(&server, 1, "bob").await;
    assert_eq!(recv_json(&mut alice).await["type"], "INFO");
    assert_eq!(recv_json(&mut bob).await["type"], "INFO");

    // alice takes the lock; both viewers are notified.
    alice.send_text(r#"{"type": "ENTER_EDIT"}"#).await;
    let enter = recv_json(&mut bob).await;
    assert_eq!(enter["type"], "ENTER_EDIT");
    assert_eq!(enter["user"]["id"], "1");
    assert_eq!(recv_json(&mut alice).await["type"], "ENTER_EDIT");
    assert_eq!(server.locks().holder_of(AssetId(1)), Some(PrincipalId(1)));

    // bob loses the race and his non-holder action is dropped; neither
    // produces any broadcast.
    bob.send_text(r#"{"type": "ENTER_EDIT"}"#).await;
    bob.send_text(r#"{"type": "EDIT_ACTION", "editAction": "ROTATE_LEFT"}"#)
        .await;

    // a malformed frame is dropped without ending alice's session.
    alice.send_text("not json at all").await;

    // alice's action reaches bob but is not echoed to alice.
    alice
        .send_text(r#"{"type": "EDIT_ACTION", "editAction": "ZOOM_IN"}"#)
        .await;
    let action = recv_json(&mut bob).await;
    assert_eq!(action["type"], "EDIT_ACTION");
    assert_eq!(action["editAction"], "ZOOM_IN");
    assert_eq!(action["user"]["id"], "1");

    // alice's next frame is her own exit, proving the action was not
    // echoed back to her.
    alice.send_text(r#"{"type": "EXIT_EDIT"}"#).await;
    assert_eq!(recv_json(&mut alice).await["type"], "EXIT_EDIT");
    assert_eq!(recv_json(&mut bob).await["type"], "EXIT_EDIT");
    assert_eq!(server.locks().holder_of(AssetId(1)), None);
}

#[tokio::test]
async fn holder_disconnect_broadcasts_exit_then_left() {
    let server = server();
    let mut alice = connect(&server, 1, "alice").await;
    assert_eq!(recv_json(&mut alice).await["type"], "INFO");

    let mut bob = connect(&server, 1, "bob").await;
    assert_eq!(recv_json(&mut alice).await["type"], "INFO");
    assert_eq!(recv_json(&mut bob).await["type"], "INFO");

    alice.send_text(r#"{"type": "ENTER_EDIT"}"#).await;
    assert_eq!(recv_json(&mut alice).await["type"], "ENTER_EDIT");
    assert_eq!(recv_json(&mut bob).await["type"], "ENTER_EDIT");

    // The holder's connection goes away without an explicit exit.
    drop(alice);

    let exit = recv_json(&mut bob).await;
    assert_eq!(exit["type"], "EXIT_EDIT");
    assert_eq!(exit["user"]["id"], "1");

    let left = recv_json(&mut bob).await;
    assert_eq!(left["type"], "INFO");
    assert!(left["message"]
        .as_str()
        .unwrap()
        .contains("left the session"));

    assert_eq!(server.locks().holder_of(AssetId(1)), None);
    assert_eq!(server.registry().viewer_count(AssetId(1)), 1);
}

#[tokio::test]
async fn non_holder_disconnect_broadcasts_only_left() {
    let server = server();
    let mut alice = connect(&server, 1, "alice").await;
    assert_eq!(recv_json(&mut alice).await["type"], "INFO");

    let bob = connect(&server, 1, "bob").await;
    assert_eq!(recv_json(&mut alice).await["type"], "INFO");

    drop(bob);

    let left = recv_json(&mut alice).await;
    assert_eq!(left["type"], "INFO");
    assert!(left["message"]
        .as_str()
        .unwrap()
        .contains("left the session"));
}
