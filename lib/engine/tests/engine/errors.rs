use crate::test_utils::{bgp, binding, context, evaluate, iri, storage, var};
use rdf_cursor_algebra::Op;
use rdf_cursor_engine::error::QueryEvaluationError;
use rdf_cursor_engine::iter::materialize;
use rdf_cursor_engine::{compile, CancellationToken, ExecutionContext, ServiceHandler};
use rdf_cursor_model::{Binding, Expression, Function, NamedNode, NamedNodePattern};
use std::error::Error;
use std::sync::Arc;

fn service(name: NamedNodePattern, silent: bool) -> Op {
    Op::Service {
        name,
        inner: Arc::new(bgp(&[("?s", "p", "?o")])),
        silent,
    }
}

fn run(op: &Op, context: ExecutionContext) -> Result<Vec<Binding>, QueryEvaluationError> {
    materialize(compile(op, Arc::new(context))?)
}

struct FixedService(Vec<Binding>);

impl ServiceHandler for FixedService {
    fn handle(
        &self,
        _service_name: &NamedNode,
        _pattern: &Arc<Op>,
        _input: &Binding,
    ) -> Result<Vec<Binding>, Box<dyn Error + Send + Sync>> {
        Ok(self.0.clone())
    }
}

struct FailingService;

impl ServiceHandler for FailingService {
    fn handle(
        &self,
        service_name: &NamedNode,
        _pattern: &Arc<Op>,
        _input: &Binding,
    ) -> Result<Vec<Binding>, Box<dyn Error + Send + Sync>> {
        Err(format!("{service_name} is unreachable").into())
    }
}

#[test]
fn test_service_without_handler() {
    let op = service(NamedNodePattern::NamedNode(iri("svc")), false);
    let result = run(&op, context(storage(&[])));
    assert!(matches!(
        result,
        Err(QueryEvaluationError::UnsupportedService(_))
    ));

    let op = service(NamedNodePattern::NamedNode(iri("svc")), true);
    let result = run(&op, context(storage(&[]))).unwrap();
    assert_eq!(result, vec![Binding::root()]);
}

#[test]
fn test_service_results_are_joined_with_input() {
    let handler = FixedService(vec![
        binding(&[("s", "a"), ("o", "1")]),
        binding(&[("s", "b"), ("o", "2")]),
    ]);
    let op = service(NamedNodePattern::NamedNode(iri("svc")), false);
    let ctx = context(storage(&[]))
        .with_service_handler(Arc::new(handler))
        .with_seed(binding(&[("s", "a")]));

    let result = run(&op, ctx).unwrap();

    assert_eq!(result, vec![binding(&[("s", "a"), ("o", "1")])]);
}

#[test]
fn test_service_failure() {
    let op = service(NamedNodePattern::NamedNode(iri("svc")), false);
    let ctx = context(storage(&[])).with_service_handler(Arc::new(FailingService));
    assert!(matches!(
        run(&op, ctx),
        Err(QueryEvaluationError::Service(_))
    ));

    let op = service(NamedNodePattern::NamedNode(iri("svc")), true);
    let ctx = context(storage(&[])).with_service_handler(Arc::new(FailingService));
    assert_eq!(run(&op, ctx).unwrap(), vec![Binding::root()]);
}

#[test]
fn test_service_name_must_be_a_bound_iri() {
    let op = service(NamedNodePattern::Variable(var("svc")), false);
    let ctx = context(storage(&[])).with_service_handler(Arc::new(FixedService(vec![])));
    assert!(matches!(
        run(&op, ctx),
        Err(QueryEvaluationError::UnboundService)
    ));

    let ctx = context(storage(&[]))
        .with_service_handler(Arc::new(FixedService(vec![])))
        .with_seed(binding(&[("svc", "1")]));
    assert!(matches!(
        run(&op, ctx),
        Err(QueryEvaluationError::InvalidServiceName(_))
    ));
}

#[test]
fn test_dataset_names_is_not_implemented() {
    let op = Op::DatasetNames(NamedNodePattern::Variable(var("g")));
    let result = compile(&op, Arc::new(context(storage(&[]))));
    assert!(matches!(
        result,
        Err(QueryEvaluationError::NotImplemented(_))
    ));
}

#[test]
fn test_unsupported_function_fails_before_evaluation() {
    let filter = Op::filter(
        vec![Expression::FunctionCall(
            Function::Custom(iri("custom")),
            vec![Expression::Variable(var("o"))],
        )],
        bgp(&[("?s", "p", "?o")]),
    );
    // The filter is only compiled lazily for every binding of the union input.
    let op = Op::Sequence(vec![
        Arc::new(bgp(&[("?s", "p", "?o")])),
        Arc::new(Op::union(filter, bgp(&[("?s", "q", "?o")]))),
    ]);

    let result = compile(&op, Arc::new(context(storage(&[]))));
    assert!(matches!(
        result,
        Err(QueryEvaluationError::NotImplemented(_))
    ));
}

#[test]
fn test_cancelled_query_fails() {
    let token = CancellationToken::new();
    token.cancel();
    let ctx = context(storage(&[("a", "p", "b")])).with_cancellation_token(token);

    let result = run(&bgp(&[("?s", "p", "?o")]), ctx);

    assert!(matches!(result, Err(QueryEvaluationError::Cancelled)));
}

#[test]
fn test_filter_errors_exclude_rows() {
    let op = Op::filter(
        vec![Expression::Variable(var("unbound"))],
        bgp(&[("?s", "p", "?o")]),
    );

    assert!(evaluate(&op, context(storage(&[("a", "p", "b")]))).is_empty());
}
