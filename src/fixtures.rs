/// Sample CIF documents shared by the parser, writer and loader tests.
pub mod cif {
    pub const MULTI_LINE: &str = "
field1 = value1
field2 = value2
object1:
    field3 = value3
    object2:
        field4 = value4
        object3:
            field5 = value5
    field6 = value6
    object4:
        field7 = value7
field8 = value8
object5:
        field9 = value9
";

    pub const DEEP_PATH: &str = "
toplevel:
    this.is.deep:
        field1 = value1
    shallow:
        field2 = value2
field3 = value3
";

    pub const VALUE_CONTINUATION: &str = "
toplevel:
    field1 = first line
           | second line
           | third line
    field2 = value2
field3 = value3
";

    pub const LIST_CONTINUATION: &str = "
# upstream pool
servers:
    hosts = alpha
          , beta
          , gamma
    port = 80
";

    /// A realistic application file: comments, quoted keys, nested sections.
    pub const APP: &str = "
# demo application
name = demo
database:
    url = pg://localhost/demo
    pool_size = 5
    timeout = 30s
    replicas = pg://a
             , pg://b
server:
    \"listen address\" = 0.0.0.0:8080
    banner = welcome
           | to the demo
";
}

pub mod test {
    use crate::path::Path;
    use crate::store::ValueStore;

    pub fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    /// Build a store from `(container, name, value)` triples.
    pub fn store(fields: &[(&str, &str, &str)]) -> ValueStore {
        let mut store = ValueStore::new();
        for (container, name, value) in fields {
            let container = path(container);
            store.put_container(&container).unwrap();
            store.put_field(&container, name, *value).unwrap();
        }
        store
    }

    #[test]
    fn every_sample_document_parses() {
        use super::cif;
        for doc in [
            cif::MULTI_LINE,
            cif::DEEP_PATH,
            cif::VALUE_CONTINUATION,
            cif::LIST_CONTINUATION,
            cif::APP,
        ] {
            crate::cif::from_str(doc).unwrap();
        }
    }
}
