mod indexed_reader_tests;
