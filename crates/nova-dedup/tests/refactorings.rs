use std::collections::BTreeSet;

use nova_dedup::{
    Cluster, FileId, Occurrence, ParameterSpec, Recommendation, RefactorError, RefactoringEngine,
    RefactoringKind, RefactoringResult, Strategy, VariationKind, Workspace,
};
use nova_dedup_syntax::render;
use pretty_assertions::assert_eq;

fn occurrence(
    ws: &Workspace,
    path: &str,
    class: &str,
    method: &str,
    start: usize,
    count: usize,
) -> Occurrence {
    ws.locate_occurrence(&FileId::new(path), class, method, start, count)
        .unwrap()
}

fn cluster(mut occurrences: Vec<Occurrence>, variation: VariationKind) -> Cluster {
    let primary = occurrences.remove(0);
    occurrences
        .into_iter()
        .fold(Cluster::new(primary), |cluster, other| cluster.with_peer(other, variation))
}

fn file<'a>(result: &'a RefactoringResult, path: &str) -> &'a str {
    result
        .files
        .get(&FileId::new(path))
        .unwrap_or_else(|| panic!("missing {path} in {:?}", result.files.keys()))
}

/// Touched files are the cluster's files plus at most one new file.
fn assert_touches_only_cluster_files(result: &RefactoringResult, cluster: &Cluster) {
    let known = cluster.files();
    let new_files: BTreeSet<&FileId> = result.files.keys().filter(|f| !known.contains(*f)).collect();
    assert!(new_files.len() <= 1, "unexpected new files: {new_files:?}");
}

const ORDER_SERVICE: &str = r#"package com.acme;

public class OrderService {
    public void place(String email) {
        if (isValidEmail(email)) {
            System.out.println(email);
        }
    }

    private boolean isValidEmail(String email) {
        return email != null && email.contains("@");
    }
}
"#;

const USER_SERVICE: &str = r#"package com.acme;

public class UserService {
    public boolean register(String email) {
        return isValidEmail(email);
    }

    private boolean isValidEmail(String email) {
        return email != null && email.contains("@");
    }
}
"#;

#[test]
fn utility_class_extraction_moves_the_method_and_rewrites_calls() {
    let ws = Workspace::from_sources([
        ("src/com/acme/OrderService.java", ORDER_SERVICE),
        ("src/com/acme/UserService.java", USER_SERVICE),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "src/com/acme/OrderService.java", "OrderService", "isValidEmail", 0, 1),
            occurrence(&ws, "src/com/acme/UserService.java", "UserService", "isValidEmail", 0, 1),
        ],
        VariationKind::Identical,
    );

    let mut engine = RefactoringEngine::default();
    let result = engine
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap();

    assert_eq!(result.kind, RefactoringKind::UtilityClass);
    assert_touches_only_cluster_files(&result, &cluster);
    assert_eq!(
        file(&result, "src/com/acme/util/ValidationUtils.java"),
        r#"package com.acme.util;

public final class ValidationUtils {
    private ValidationUtils() {
        throw new UnsupportedOperationException("Utility class");
    }

    public static boolean isValidEmail(String email) {
        return email != null && email.contains("@");
    }
}
"#
    );
    assert_eq!(
        file(&result, "src/com/acme/OrderService.java"),
        r#"package com.acme;

import com.acme.util.ValidationUtils;

public class OrderService {
    public void place(String email) {
        if (ValidationUtils.isValidEmail(email)) {
            System.out.println(email);
        }
    }
}
"#
    );
    let user = file(&result, "src/com/acme/UserService.java");
    assert!(user.contains("return ValidationUtils.isValidEmail(email);"));
    for path in ["src/com/acme/OrderService.java", "src/com/acme/UserService.java"] {
        assert!(!file(&result, path).contains("boolean isValidEmail("));
    }
}

#[test]
fn utility_class_extraction_rejects_instance_state() {
    let source = r#"package com.acme;

class Counter {
    private int count;

    int next() {
        return count + 1;
    }
}
"#;
    let ws = Workspace::from_sources([("Counter.java", source)]).unwrap();
    let cluster = Cluster::new(occurrence(&ws, "Counter.java", "Counter", "next", 0, 1));

    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap_err();
    assert!(
        matches!(&err, RefactorError::NotStaticCompatible { name, .. } if name == "next"),
        "{err}"
    );
}

const CSV_EXPORTER: &str = r#"package com.acme;

public class CsvExporter {
    public String export(String value) {
        return header(value);
    }

    protected String header(String title) {
        String trimmed = title.trim();
        return trimmed.toUpperCase();
    }
}
"#;

const JSON_EXPORTER: &str = r#"package com.acme;

public class JsonExporter {
    protected String header(String title) {
        String trimmed = title.trim();
        return trimmed.toUpperCase();
    }
}
"#;

#[test]
fn parent_class_extraction_keeps_one_copy_of_the_body() {
    let ws = Workspace::from_sources([
        ("src/main/java/com/acme/CsvExporter.java", CSV_EXPORTER),
        ("src/main/java/com/acme/JsonExporter.java", JSON_EXPORTER),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "src/main/java/com/acme/CsvExporter.java", "CsvExporter", "header", 0, 2),
            occurrence(&ws, "src/main/java/com/acme/JsonExporter.java", "JsonExporter", "header", 0, 2),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParentClass))
        .unwrap();

    assert_eq!(result.kind, RefactoringKind::ParentClass);
    assert_touches_only_cluster_files(&result, &cluster);
    assert_eq!(
        file(&result, "src/main/java/com/acme/BaseExporter.java"),
        r#"package com.acme;

public abstract class BaseExporter {
    protected String header(String title) {
        String trimmed = title.trim();
        return trimmed.toUpperCase();
    }
}
"#
    );
    assert_eq!(
        file(&result, "src/main/java/com/acme/CsvExporter.java"),
        r#"package com.acme;

public class CsvExporter extends BaseExporter {
    public String export(String value) {
        return header(value);
    }
}
"#
    );
    assert!(file(&result, "src/main/java/com/acme/JsonExporter.java")
        .contains("public class JsonExporter extends BaseExporter {"));
    let copies: usize = result
        .files
        .values()
        .map(|text| text.matches("title.trim()").count())
        .sum();
    assert_eq!(copies, 1);
}

#[test]
fn parent_class_extraction_refuses_a_different_superclass() {
    let json = JSON_EXPORTER.replace("class JsonExporter {", "class JsonExporter extends Writer {");
    let ws = Workspace::from_sources([
        ("CsvExporter.java", CSV_EXPORTER),
        ("JsonExporter.java", json.as_str()),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "CsvExporter.java", "CsvExporter", "header", 0, 2),
            occurrence(&ws, "JsonExporter.java", "JsonExporter", "header", 0, 2),
        ],
        VariationKind::Identical,
    );

    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParentClass))
        .unwrap_err();
    assert!(
        matches!(&err, RefactorError::ConflictingSuperclass { existing, .. } if existing == "Writer"),
        "{err}"
    );
}

fn formatter_test(cases: &[(&str, i32)]) -> String {
    let mut text = String::from(
        "package com.acme;\n\nimport org.junit.jupiter.api.Test;\n\nclass FormatterTest {\n",
    );
    for (index, (input, width)) in cases.iter().enumerate() {
        text.push_str(&format!(
            "    @Test\n    void formats{}() {{\n        assertTrue(Formatter.fits(\"{input}\", {width}));\n    }}\n\n",
            index + 1
        ));
    }
    text.push_str("}\n");
    text
}

fn formatter_cluster(ws: &Workspace, count: usize) -> Cluster {
    let occurrences = (1..=count)
        .map(|n| occurrence(ws, "FormatterTest.java", "FormatterTest", &format!("formats{n}"), 0, 1))
        .collect();
    cluster(occurrences, VariationKind::LiteralOnly)
}

#[test]
fn parameterized_test_merges_literal_variants() {
    let source = formatter_test(&[("a", 1), ("b", 2), ("c", 3)]);
    let ws = Workspace::from_sources([("FormatterTest.java", source.as_str())]).unwrap();
    let cluster = formatter_cluster(&ws, 3);

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParameterizedTest))
        .unwrap();

    assert_eq!(result.kind, RefactoringKind::ParameterizedTest);
    assert_eq!(result.files.len(), 1);
    let text = file(&result, "FormatterTest.java");
    assert!(text.contains(
        r#"    @ParameterizedTest
    @CsvSource({"a, 1", "b, 2", "c, 3"})
    void formats(String input, int expected) {
        assertTrue(Formatter.fits(input, expected));
    }
"#
    ));
    assert!(text.contains("import org.junit.jupiter.params.ParameterizedTest;"));
    assert!(text.contains("import org.junit.jupiter.params.provider.CsvSource;"));
    for original in ["formats1", "formats2", "formats3"] {
        assert!(!text.contains(original), "{original} should be merged");
    }
}

#[test]
fn parameterized_test_needs_three_occurrences() {
    let source = formatter_test(&[("a", 1), ("b", 2)]);
    let ws = Workspace::from_sources([("FormatterTest.java", source.as_str())]).unwrap();
    let before = render(ws.tree(&FileId::new("FormatterTest.java")).unwrap());
    let cluster = formatter_cluster(&ws, 2);

    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParameterizedTest))
        .unwrap_err();

    assert!(matches!(
        err,
        RefactorError::InsufficientOccurrences {
            required: 3,
            found: 2
        }
    ));
    assert_eq!(render(ws.tree(&FileId::new("FormatterTest.java")).unwrap()), before);
}

const CART_TEST: &str = r#"package com.acme;

import java.util.ArrayList;
import java.util.List;
import org.junit.jupiter.api.Test;

class CartTest {
    @Test
    void addsItem() {
        String owner = "alice";
        List<String> items = new ArrayList<>();
        items.add(owner);
        assertEquals(1, items.size());
    }

    @Test
    void removesItem() {
        String owner = "alice";
        List<String> items = new ArrayList<>();
        items.remove(owner);
        assertEquals(0, items.size());
    }
}
"#;

#[test]
fn setup_hook_promotes_only_shareable_locals() {
    let ws = Workspace::from_sources([("CartTest.java", CART_TEST)]).unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "CartTest.java", "CartTest", "addsItem", 0, 2),
            occurrence(&ws, "CartTest.java", "CartTest", "removesItem", 0, 2),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .extract_setup_hook(&ws, &cluster)
        .unwrap();

    assert_eq!(result.kind, RefactoringKind::SetupHook);
    assert_touches_only_cluster_files(&result, &cluster);
    let text = file(&result, "CartTest.java");
    assert!(text.contains("import org.junit.jupiter.api.BeforeEach;"));
    assert!(text.contains(
        r#"class CartTest {
    private String owner;

    @BeforeEach
    public void setUp() {
        owner = "alice";
        List<String> items = new ArrayList<>();
    }
"#
    ));
    assert!(!text.contains("private List<String> items;"));
    assert!(text.contains("    void addsItem() {\n        items.add(owner);"));
    assert!(text.contains("    void removesItem() {\n        items.remove(owner);"));
}

#[test]
fn setup_hook_requires_a_test_class() {
    let source = "class Plain {\n    void a() {\n        int x = 1;\n    }\n\n    void b() {\n        int x = 1;\n    }\n}\n";
    let ws = Workspace::from_sources([("Plain.java", source)]).unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "Plain.java", "Plain", "a", 0, 1),
            occurrence(&ws, "Plain.java", "Plain", "b", 0, 1),
        ],
        VariationKind::Identical,
    );
    let err = RefactoringEngine::default()
        .extract_setup_hook(&ws, &cluster)
        .unwrap_err();
    assert!(matches!(err, RefactorError::NotATestClass(ref name) if name == "Plain"));
}

const REPORT_SERVICE: &str = r#"package com.acme;

public class ReportService {
    public void daily(String name) {
        String header = "Daily report";
        System.out.println(header + " for " + name);
        System.out.println("-----");
        send(name);
    }

    public void weekly(String name) {
        String header = "Weekly report";
        System.out.println(header + " for " + name);
        System.out.println("-----");
        send(name);
    }

    private void send(String name) {
    }
}
"#;

#[test]
fn helper_method_replaces_every_run_with_a_call() {
    let ws = Workspace::from_sources([("ReportService.java", REPORT_SERVICE)]).unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "ReportService.java", "ReportService", "daily", 0, 3),
            occurrence(&ws, "ReportService.java", "ReportService", "weekly", 0, 3),
        ],
        VariationKind::LiteralOnly,
    );
    let recommendation = Recommendation::new(Strategy::ExtractHelperMethod)
        .with_name("printHeader")
        .with_parameters(vec![ParameterSpec::new("title", "String")]);

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &recommendation)
        .unwrap();

    assert_eq!(result.kind, RefactoringKind::HelperMethod);
    assert_eq!(
        file(&result, "ReportService.java"),
        r#"package com.acme;

public class ReportService {
    public void daily(String name) {
        printHeader("Daily report", name);
        send(name);
    }

    private void printHeader(String title, String name) {
        String header = title;
        System.out.println(header + " for " + name);
        System.out.println("-----");
    }

    public void weekly(String name) {
        printHeader("Weekly report", name);
        send(name);
    }

    private void send(String name) {
    }
}
"#
    );
}

#[test]
fn helper_method_returns_the_local_used_afterwards() {
    let source = r#"class Totals {
    int first(int[] values) {
        int sum = 0;
        for (int v : values) {
            sum += v;
        }
        return sum * 2;
    }

    static int second(int[] values) {
        int sum = 0;
        for (int v : values) {
            sum += v;
        }
        return sum + 1;
    }
}
"#;
    let ws = Workspace::from_sources([("Totals.java", source)]).unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "Totals.java", "Totals", "first", 0, 2),
            occurrence(&ws, "Totals.java", "Totals", "second", 0, 2),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(
            &ws,
            &cluster,
            &Recommendation::new(Strategy::ExtractHelperMethod).with_name("sumOf"),
        )
        .unwrap();

    let text = file(&result, "Totals.java");
    assert!(text.contains("    private static int sumOf(int[] values) {\n        int sum = 0;"));
    assert!(text.contains("        return sum;\n    }"));
    assert!(text.contains("        int sum = sumOf(values);\n        return sum * 2;"));
    assert!(text.contains("        int sum = sumOf(values);\n        return sum + 1;"));
}

#[test]
fn helper_names_stay_unique_across_clusters() {
    let alpha = "class Alpha {\n    void a() {\n        log(\"start\");\n    }\n\n    void b() {\n        log(\"start\");\n    }\n}\n";
    let beta = alpha.replace("Alpha", "Beta");
    let ws = Workspace::from_sources([("Alpha.java", alpha), ("Beta.java", beta.as_str())]).unwrap();
    let recommendation = Recommendation::new(Strategy::ExtractHelperMethod).with_name("logStart");
    let mut engine = RefactoringEngine::default();

    let mut names = Vec::new();
    for class in ["Alpha", "Beta"] {
        let path = format!("{class}.java");
        let cluster = cluster(
            vec![
                occurrence(&ws, &path, class, "a", 0, 1),
                occurrence(&ws, &path, class, "b", 0, 1),
            ],
            VariationKind::Identical,
        );
        let result = engine.apply(&ws, &cluster, &recommendation).unwrap();
        assert_touches_only_cluster_files(&result, &cluster);
        assert_eq!(result.files.len(), 1);
        let text = file(&result, &path);
        let name = if text.contains("private void logStart1()") {
            "logStart1"
        } else {
            "logStart"
        };
        assert_eq!(text.matches(&format!("{name}();")).count(), 2);
        names.push(name);
    }
    assert_eq!(names, vec!["logStart", "logStart1"]);
}

#[test]
fn helper_method_spans_files_with_one_helper_per_class() {
    let first = "package a;\n\nclass First {\n    void run(int n) {\n        int twice = n * 2;\n        System.out.println(twice);\n    }\n}\n";
    let second = "package b;\n\nclass Second {\n    void go(int n) {\n        int twice = n * 2;\n        System.out.println(twice);\n    }\n}\n";
    let ws = Workspace::from_sources([("a/First.java", first), ("b/Second.java", second)]).unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "a/First.java", "First", "run", 0, 2),
            occurrence(&ws, "b/Second.java", "Second", "go", 0, 2),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(
            &ws,
            &cluster,
            &Recommendation::new(Strategy::ExtractHelperMethod).with_name("printTwice"),
        )
        .unwrap();

    assert_eq!(result.files.len(), 2);
    assert_touches_only_cluster_files(&result, &cluster);
    for path in ["a/First.java", "b/Second.java"] {
        let text = file(&result, path);
        assert_eq!(text.matches("private void printTwice(int n) {").count(), 1);
        assert!(text.contains("        printTwice(n);\n    }"));
    }
}

#[test]
fn escaping_mutations_fail_validation() {
    let source = "class A {\n    void a() {\n        int total = 0;\n        total++;\n    }\n\n    void b() {\n        int total = 0;\n        total++;\n    }\n}\n";
    let ws = Workspace::from_sources([("A.java", source)]).unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "A.java", "A", "a", 1, 1),
            occurrence(&ws, "A.java", "A", "b", 1, 1),
        ],
        VariationKind::Identical,
    );
    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractHelperMethod))
        .unwrap_err();
    match err {
        RefactorError::Validation(report) => assert!(!report.is_valid()),
        other => panic!("expected a validation failure, got {other}"),
    }
}

#[test]
fn manual_review_is_not_executed() {
    let ws = Workspace::from_sources([("A.java", "class A {\n    void a() {\n        go();\n    }\n}\n")])
        .unwrap();
    let cluster = Cluster::new(occurrence(&ws, "A.java", "A", "a", 0, 1));
    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ManualReviewRequired))
        .unwrap_err();
    assert!(matches!(
        err,
        RefactorError::UnsupportedStrategy(Strategy::ManualReviewRequired)
    ));
}

#[test]
fn utility_class_extraction_keeps_renamed_copies_as_delegates() {
    let user = USER_SERVICE
        .replace("return isValidEmail(email);", "return checkMail(email);")
        .replace("private boolean isValidEmail(", "private boolean checkMail(");
    let ws = Workspace::from_sources([
        ("src/com/acme/OrderService.java", ORDER_SERVICE),
        ("src/com/acme/UserService.java", user.as_str()),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "src/com/acme/OrderService.java", "OrderService", "isValidEmail", 0, 1),
            occurrence(&ws, "src/com/acme/UserService.java", "UserService", "checkMail", 0, 1),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap();

    let text = file(&result, "src/com/acme/UserService.java");
    assert!(text.contains("import com.acme.util.ValidationUtils;"));
    assert!(text.contains("    public boolean register(String email) {\n        return checkMail(email);\n    }"));
    assert!(text.contains(
        "    private boolean checkMail(String email) {\n        return ValidationUtils.isValidEmail(email);\n    }"
    ));
    assert!(!file(&result, "src/com/acme/OrderService.java").contains("boolean isValidEmail("));
}

#[test]
fn utility_class_extraction_rejects_static_members_of_the_class() {
    let source = r#"package com.acme;

class MailRules {
    private static final String AT = "@";

    private static boolean isValidEmail(String email) {
        return email.contains(AT);
    }
}
"#;
    let ws = Workspace::from_sources([("MailRules.java", source)]).unwrap();
    let cluster = Cluster::new(occurrence(&ws, "MailRules.java", "MailRules", "isValidEmail", 0, 1));

    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap_err();
    assert!(
        matches!(
            &err,
            RefactorError::NotStaticCompatible { name, reason }
                if name == "isValidEmail" && reason == "reads static field `AT`"
        ),
        "{err}"
    );
}

#[test]
fn utility_class_extraction_turns_constructors_into_static_methods() {
    let upload = r#"package com.acme;

public class Upload {
    public Upload(String path) {
        if (path.isEmpty()) {
            throw new IllegalArgumentException("empty path");
        }
    }
}
"#;
    let download = upload.replace("Upload", "Download");
    let ws = Workspace::from_sources([
        ("src/com/acme/Upload.java", upload),
        ("src/com/acme/Download.java", download.as_str()),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "src/com/acme/Upload.java", "Upload", "Upload", 0, 1),
            occurrence(&ws, "src/com/acme/Download.java", "Download", "Download", 0, 1),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(
            &ws,
            &cluster,
            &Recommendation::new(Strategy::ExtractUtilityClass).with_name("validatePath"),
        )
        .unwrap();

    assert_touches_only_cluster_files(&result, &cluster);
    let utility = file(&result, "src/com/acme/util/ValidationUtils.java");
    assert!(utility.contains("public final class ValidationUtils {"));
    assert!(utility.contains("    public static void validatePath(String path) {"));
    assert!(utility.contains("throw new IllegalArgumentException(\"empty path\");"));
    for class in ["Upload", "Download"] {
        let text = file(&result, &format!("src/com/acme/{class}.java"));
        assert!(text.contains("import com.acme.util.ValidationUtils;"));
        assert!(text.contains(&format!(
            "    public {class}(String path) {{\n        ValidationUtils.validatePath(path);\n    }}"
        )));
    }
}

#[test]
fn utility_class_extraction_leaves_other_overloads_alone() {
    let order = r#"package com.acme;

public class OrderService {
    public void place(String email) {
        if (isValidEmail(email)) {
            System.out.println(email);
        }
        if (isValidEmail(email, true)) {
            System.out.println("strict");
        }
    }

    private boolean isValidEmail(String email) {
        return email != null && email.contains("@");
    }

    private boolean isValidEmail(String email, boolean strict) {
        return strict && email.endsWith(".com");
    }
}
"#;
    let ws = Workspace::from_sources([
        ("src/com/acme/OrderService.java", order),
        ("src/com/acme/UserService.java", USER_SERVICE),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "src/com/acme/OrderService.java", "OrderService", "isValidEmail", 0, 1),
            occurrence(&ws, "src/com/acme/UserService.java", "UserService", "isValidEmail", 0, 1),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap();

    let text = file(&result, "src/com/acme/OrderService.java");
    assert!(text.contains("        if (ValidationUtils.isValidEmail(email)) {"));
    assert!(text.contains("        if (isValidEmail(email, true)) {"));
    assert!(text.contains("    private boolean isValidEmail(String email, boolean strict) {"));
    assert!(!text.contains("private boolean isValidEmail(String email) {"));
}

#[test]
fn utility_class_extraction_keeps_comments() {
    let order = ORDER_SERVICE
        .replace(
            "public class OrderService {",
            "/** Places orders. Do not remove: legal requirement. */\npublic class OrderService {",
        )
        .replace(
            "        if (isValidEmail(email)) {",
            "        // keep in sync with billing\n        if (isValidEmail(email)) {",
        );
    let ws = Workspace::from_sources([
        ("src/com/acme/OrderService.java", order.as_str()),
        ("src/com/acme/UserService.java", USER_SERVICE),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "src/com/acme/OrderService.java", "OrderService", "isValidEmail", 0, 1),
            occurrence(&ws, "src/com/acme/UserService.java", "UserService", "isValidEmail", 0, 1),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap();

    let text = file(&result, "src/com/acme/OrderService.java");
    assert!(text.contains(
        "/** Places orders. Do not remove: legal requirement. */\npublic class OrderService {"
    ));
    assert!(text.contains(
        "        // keep in sync with billing\n        if (ValidationUtils.isValidEmail(email)) {"
    ));
}

#[test]
fn utility_class_extraction_moves_switch_and_assert_bodies() {
    let source = r#"class Labels {
    String label(int code) {
        assert code >= 0;
        switch (code) {
            case 1:
                return "one";
            default:
                return "other";
        }
    }
}
"#;
    let ws = Workspace::from_sources([("Labels.java", source)]).unwrap();
    let cluster = Cluster::new(occurrence(&ws, "Labels.java", "Labels", "label", 0, 2));

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractUtilityClass))
        .unwrap();

    let utility = file(&result, "util/CommonUtils.java");
    assert!(utility.contains("    public static String label(int code) {"));
    assert!(utility.contains("        assert code >= 0;\n        switch (code) {"));
    assert!(utility.contains("            case 1:\n                return \"one\";"));
    assert!(!file(&result, "Labels.java").contains("switch"));
}

const BASE_REPOSITORY: &str = r#"package com.acme;

public class BaseRepository {
    private String key(String id) {
        return id.trim();
    }
}
"#;

const USER_REPOSITORY: &str = r#"package com.acme;

public class UserRepository {
    public String find(String id) {
        return key(id);
    }

    private String key(String id) {
        return id.trim();
    }
}
"#;

#[test]
fn parent_class_extraction_promotes_a_cluster_class() {
    let ws = Workspace::from_sources([
        ("BaseRepository.java", BASE_REPOSITORY),
        ("UserRepository.java", USER_REPOSITORY),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "BaseRepository.java", "BaseRepository", "key", 0, 1),
            occurrence(&ws, "UserRepository.java", "UserRepository", "key", 0, 1),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParentClass))
        .unwrap();

    assert_eq!(result.files.len(), 2);
    assert!(file(&result, "BaseRepository.java")
        .contains("    protected String key(String id) {\n        return id.trim();\n    }"));
    let user = file(&result, "UserRepository.java");
    assert!(user.contains("public class UserRepository extends BaseRepository {"));
    assert!(user.contains("        return key(id);"));
    assert!(!user.contains("String key(String id)"));
}

#[test]
fn parent_class_extraction_keeps_renamed_copies_as_delegates() {
    let json = JSON_EXPORTER.replace("String header(", "String title(");
    let ws = Workspace::from_sources([
        ("CsvExporter.java", CSV_EXPORTER),
        ("JsonExporter.java", json.as_str()),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "CsvExporter.java", "CsvExporter", "header", 0, 2),
            occurrence(&ws, "JsonExporter.java", "JsonExporter", "title", 0, 2),
        ],
        VariationKind::Identical,
    );

    let result = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParentClass))
        .unwrap();

    let text = file(&result, "JsonExporter.java");
    assert!(text.contains("public class JsonExporter extends BaseExporter {"));
    assert!(text.contains("    protected String title(String title) {\n        return header(title);\n    }"));
}

#[test]
fn parent_class_extraction_stops_on_a_differing_body() {
    let json = JSON_EXPORTER.replace("trimmed.toUpperCase()", "trimmed.toLowerCase()");
    let ws = Workspace::from_sources([
        ("CsvExporter.java", CSV_EXPORTER),
        ("JsonExporter.java", json.as_str()),
    ])
    .unwrap();
    let cluster = cluster(
        vec![
            occurrence(&ws, "CsvExporter.java", "CsvExporter", "header", 0, 1),
            occurrence(&ws, "JsonExporter.java", "JsonExporter", "header", 0, 1),
        ],
        VariationKind::Identical,
    );

    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParentClass))
        .unwrap_err();
    assert!(
        matches!(
            &err,
            RefactorError::BodyMismatch { primary, other }
                if primary == "header" && other == "JsonExporter.header"
        ),
        "{err}"
    );
}

#[test]
fn parameterized_test_refuses_methods_already_parameterized() {
    let source = formatter_test(&[("a", 1), ("b", 2), ("c", 3)])
        .replacen("    @Test\n", "    @ParameterizedTest\n", 1);
    let ws = Workspace::from_sources([("FormatterTest.java", source.as_str())]).unwrap();
    let cluster = formatter_cluster(&ws, 3);

    let err = RefactoringEngine::default()
        .apply(&ws, &cluster, &Recommendation::new(Strategy::ExtractParameterizedTest))
        .unwrap_err();
    assert!(
        matches!(&err, RefactorError::AlreadyParameterized(name) if name == "formats1"),
        "{err}"
    );
}
