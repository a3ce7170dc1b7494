//! Web front-end: a compose page and the route it posts to.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiState;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>whisper</title></head>
<body>
<h1>whisper</h1>
<form id="compose">
  <input id="body" autocomplete="off" autofocus>
  <button type="submit">send</button>
</form>
<h2>peers</h2>
<ul id="peers"></ul>
<script>
async function refreshPeers() {
  const resp = await fetch("/peers");
  const { peers } = await resp.json();
  const list = document.getElementById("peers");
  list.replaceChildren(...peers.map((p) => {
    const li = document.createElement("li");
    li.textContent = p;
    return li;
  }));
}
document.getElementById("compose").addEventListener("submit", async (e) => {
  e.preventDefault();
  const input = document.getElementById("body");
  if (!input.value) return;
  await fetch("/send", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ body: input.value }),
  });
  input.value = "";
});
refreshPeers();
setInterval(refreshPeers, 5000);
</script>
</body>
</html>
"#;

pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub body: String,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub id: String,
    pub addr: String,
}

pub async fn handle_send(
    State(state): State<ApiState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, (StatusCode, String)> {
    if req.body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "body must not be empty".to_string()));
    }

    let message = state.originator.originate(req.body);
    tracing::debug!(id = %message.id, "message composed over http");

    Ok(Json(SendResponse {
        id: message.id,
        addr: message.addr,
    }))
}
