//! Backend worker: owns the tokio runtime and the classifier client, executes
//! queued commands and reports outcomes back to the UI.

use std::{sync::Arc, thread, time::Duration};

use client_core::{
    with_deadline, ClassifierService, ClientSettings, HttpClassifierClient,
    MissingClassifierService,
};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};

fn connect(service_url: &str, ui_tx: &Sender<UiEvent>) -> Arc<dyn ClassifierService> {
    match HttpClassifierClient::new(service_url) {
        Ok(client) => {
            tracing::info!(service_url, "classifier client configured");
            let _ = ui_tx.try_send(UiEvent::ServiceConfigured {
                service_url: client.base_url().to_string(),
            });
            Arc::new(client)
        }
        Err(err) => {
            tracing::warn!(service_url, "classifier client unavailable: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_service(
                UiErrorContext::General,
                &err,
            )));
            Arc::new(MissingClassifierService)
        }
    }
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                    UiErrorCategory::Startup,
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let mut service = connect(&settings.service_url, &ui_tx);
        let mut request_timeout: Duration = settings.request_timeout;
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend command received");
            match cmd {
                BackendCommand::Configure {
                    service_url,
                    request_timeout: timeout,
                } => {
                    service = connect(&service_url, &ui_tx);
                    request_timeout = timeout;
                }
                BackendCommand::CheckHealth => {
                    let service = Arc::clone(&service);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        let event = match service.health(request_timeout).await {
                            Ok(banner) => UiEvent::Info(format!("Service reachable: {}", banner.message)),
                            Err(err) => UiEvent::Error(UiError::from_service(
                                UiErrorContext::HealthCheck,
                                &err,
                            )),
                        };
                        let _ = ui_tx.try_send(event);
                    });
                }
                BackendCommand::Predict(request) => {
                    let service = Arc::clone(&service);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        let outcome = with_deadline(
                            request_timeout,
                            service.predict(&request.image, request_timeout),
                        )
                        .await;
                        // Blocking send: the UI must see every completion.
                        let _ = ui_tx.send(UiEvent::PredictionFinished {
                            ticket: request.ticket,
                            outcome,
                        });
                    });
                }
                BackendCommand::Visualize(request) => {
                    let service = Arc::clone(&service);
                    let ui_tx = ui_tx.clone();
                    runtime.spawn(async move {
                        let outcome = with_deadline(
                            request_timeout,
                            service.visualize(&request.image, request_timeout),
                        )
                        .await;
                        let _ = ui_tx.send(UiEvent::VisualizationFinished {
                            ticket: request.ticket,
                            outcome,
                        });
                    });
                }
            }
        }
        tracing::info!("backend command queue closed; worker exiting");
    });
}
