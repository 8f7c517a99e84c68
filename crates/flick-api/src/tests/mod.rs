mod media_routes;
mod support;
