mod call_graph;
mod channel_refs;
mod multitask;
mod scope;
mod subroutine_call;
