//! gRPC service implementation: translates between the generated protobuf
//! wire types and the domain `HookRequest`/`HookResponse` types in
//! [`crate::model`], then delegates to [`crate::dispatch`].

use tonic::{Request, Response, Status};

use crate::dispatch;
use crate::model::{HookRequest, HookResponse, ReturnOverrides};
use crate::proto::{
    dpop_validator_server::DpopValidator, Event, EventReply, HookObject,
    ReturnOverrides as ProtoReturnOverrides,
};

#[derive(Debug, Default)]
pub struct DpopValidatorService;

#[tonic::async_trait]
impl DpopValidator for DpopValidatorService {
    async fn dispatch(
        &self,
        request: Request<HookObject>,
    ) -> Result<Response<HookObject>, Status> {
        let hook_object = request.into_inner();
        let req = to_domain_request(&hook_object);
        let response = dispatch::handle(&req);

        let mut reply = hook_object;
        if let Some(inner) = reply.request.as_mut() {
            apply_response(inner, response);
        }

        Ok(Response::new(reply))
    }

    async fn dispatch_event(
        &self,
        request: Request<Event>,
    ) -> Result<Response<EventReply>, Status> {
        let event = request.into_inner();
        tracing::debug!(name = %event.name, "received event");
        Ok(Response::new(EventReply {}))
    }
}

fn to_domain_request(hook_object: &HookObject) -> HookRequest {
    let req = hook_object.request.clone().unwrap_or_default();
    HookRequest {
        hook_name: hook_object.hook_name.clone(),
        headers: req.headers,
        method: req.method,
        url: req.url,
    }
}

fn apply_response(target: &mut crate::proto::Request, response: HookResponse) {
    target.set_headers = response.set_headers;
    target.delete_headers = response.delete_headers;
    target.return_overrides = response.return_overrides.map(to_proto_overrides);
}

fn to_proto_overrides(overrides: ReturnOverrides) -> ProtoReturnOverrides {
    ProtoReturnOverrides {
        response_code: overrides.response_code,
        response_error: overrides.response_error,
        headers: overrides.headers,
    }
}
