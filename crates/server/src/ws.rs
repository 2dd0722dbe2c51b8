use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use slap_gameroom::ClientCommand;
use slap_gameroom::Parlor;

/// Upgrades the request and pumps the session: outbound messages from the
/// parlor drain to the socket, inbound frames parse into commands and go to
/// dispatch. Either side closing tears the session down and reports the
/// disconnect.
pub async fn socket(
    parlor: web::Data<Parlor>,
    req: HttpRequest,
    body: web::Payload,
) -> impl Responder {
    let (response, mut session, mut stream) = match actix_ws::handle(&req, body) {
        Ok(parts) => parts,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let parlor = parlor.into_inner();
    actix_web::rt::spawn(async move {
        use futures::StreamExt;
        let socket_id = parlor.connect(tx).await;
        log::debug!("[ws {}] connected", socket_id);
        'sesh: loop {
            tokio::select! {
                biased;
                outbound = rx.recv() => match outbound {
                    Some(message) => {
                        if session.text(message.to_json()).await.is_err() {
                            break 'sesh;
                        }
                    }
                    None => break 'sesh,
                },
                inbound = stream.next() => match inbound {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(command) => parlor.dispatch(socket_id, command).await,
                            Err(e) => {
                                log::debug!("[ws {}] malformed command: {}", socket_id, e);
                                parlor.reject(socket_id, "malformed command").await;
                            }
                        }
                    }
                    Some(Ok(actix_ws::Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break 'sesh;
                        }
                    }
                    Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                    Some(Err(_)) => break 'sesh,
                    None => break 'sesh,
                    _ => continue 'sesh,
                },
            }
        }
        parlor.disconnect(socket_id).await;
        let _ = session.close(None).await;
        log::debug!("[ws {}] disconnected", socket_id);
    });
    response
}
